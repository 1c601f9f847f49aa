use hyper::StatusCode;
use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
};

#[derive(Debug)]
pub enum ErrorKind {
    BuildingRequest,
    Sending,
    Timeout,
    ChunkingResponse,
    Response {
        route: String,
        status: StatusCode,
        bytes: Vec<u8>,
    },
    Deserialize,
}

#[derive(Debug)]
pub struct RobloxError {
    pub(super) source: Option<Box<dyn StdError + Send + Sync>>,
    pub(super) kind: ErrorKind,
}

#[derive(Debug)]
pub struct DeserializeBodyError {
    pub(super) source: Option<Box<dyn StdError + Send + Sync>>,
    pub(super) bytes: Vec<u8>,
}

impl RobloxError {
    #[must_use]
    pub const fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The status Roblox answered with, if the request got that far.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match &self.kind {
            ErrorKind::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The `message` of the first entry of Roblox's `{"errors": [...]}` body.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        let ErrorKind::Response { bytes, .. } = &self.kind else {
            return None;
        };
        let body = serde_json::from_slice::<serde_json::Value>(bytes).ok()?;
        body.get("errors")?
            .get(0)?
            .get("message")?
            .as_str()
            .map(ToString::to_string)
    }

    #[must_use]
    pub fn from_parts(kind: ErrorKind, source: Option<Box<dyn StdError + Send + Sync>>) -> Self {
        Self { source, kind }
    }
}

impl Display for RobloxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.kind() {
            ErrorKind::BuildingRequest => write!(f, "failed to build the request"),
            ErrorKind::Sending => write!(f, "sending the request failed"),
            ErrorKind::Timeout => write!(f, "the request timed out"),
            ErrorKind::ChunkingResponse => write!(f, "chunking the response failed"),
            ErrorKind::Response {
                route,
                status,
                bytes: _,
            } => match self.message() {
                Some(message) => write!(f, "failed with {status} on {route}: {message}"),
                None => write!(f, "failed with {status} on {route}"),
            },
            ErrorKind::Deserialize => write!(f, "error deserializing"),
        }
    }
}

impl StdError for RobloxError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| &**source as &(dyn StdError + 'static))
    }
}

impl Display for DeserializeBodyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let display = String::from_utf8_lossy(&self.bytes);
        write!(f, "bytes: {display}")
    }
}

impl StdError for DeserializeBodyError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| &**source as &(dyn StdError + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_error_reports_roblox_message() {
        let err = RobloxError::from_parts(
            ErrorKind::Response {
                route: "https://groups.roblox.com/v1/groups/1/users/2".into(),
                status: StatusCode::BAD_REQUEST,
                bytes: br#"{"errors":[{"code":2,"message":"The roleset is invalid or does not exist."}]}"#
                    .to_vec(),
            },
            None,
        );
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(
            err.to_string(),
            "failed with 400 Bad Request on https://groups.roblox.com/v1/groups/1/users/2: The roleset is invalid or does not exist."
        );
    }

    #[test]
    fn transport_errors_have_no_status() {
        let err = RobloxError::from_parts(ErrorKind::Timeout, None);
        assert!(err.status().is_none());
        assert!(err.message().is_none());
    }
}
