use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bloxmesh_core::{
    error::{CoreError, ErrorKind},
    rules::AddRuleError,
    suspensions::SetSuspendedRoleError,
};
use serde_json::json;
use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    NotFound(String),
    Core(CoreError),
}

impl ApiError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Core(err) => match err.kind() {
                ErrorKind::Config => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Roblox => StatusCode::BAD_GATEWAY,
                ErrorKind::Database | ErrorKind::Discord => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Core(err) => match err.kind() {
                ErrorKind::Config => "CONFIG_ERROR",
                ErrorKind::NotFound => "NOT_FOUND",
                ErrorKind::Roblox => "ROBLOX_ERROR",
                ErrorKind::Database => "DATABASE_ERROR",
                ErrorKind::Discord => "DISCORD_ERROR",
            },
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::BadRequest(message) | Self::NotFound(message) => f.write_str(message),
            Self::Unauthorized => f.write_str("missing or invalid credentials"),
            Self::Core(err) => Display::fmt(err, f),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(err = %self, code, "request failed");
        } else {
            tracing::debug!(err = %self, code, "request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));
        (status, body).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<AddRuleError> for ApiError {
    fn from(err: AddRuleError) -> Self {
        match err {
            AddRuleError::InvalidGroup => Self::NotFound("the group does not exist".into()),
            AddRuleError::InvalidRole => Self::BadRequest("the role is not part of this group".into()),
            AddRuleError::Generic(err) => Self::Core(err),
        }
    }
}

impl From<SetSuspendedRoleError> for ApiError {
    fn from(err: SetSuspendedRoleError) -> Self {
        match err {
            SetSuspendedRoleError::InvalidGroup => Self::NotFound("the group does not exist".into()),
            SetSuspendedRoleError::InvalidRole => {
                Self::BadRequest("the role is not part of this group".into())
            }
            SetSuspendedRoleError::Generic(err) => Self::Core(err),
        }
    }
}
