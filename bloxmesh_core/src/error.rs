use bloxmesh_database::DatabaseError;
use bloxmesh_models::automation::DocumentError;
use bloxmesh_roblox::error::RobloxError;
use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
};
use twilight_http::Error as DiscordHttpError;

#[derive(Debug)]
pub struct CoreError {
    source: Option<Box<dyn StdError + Send + Sync>>,
    kind: ErrorKind,
}

#[derive(Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The group lacks configuration the operation needs.
    Config,
    Database,
    Discord,
    /// A referenced sub-group, rule or suspension no longer exists.
    NotFound,
    Roblox,
}

impl CoreError {
    #[must_use]
    pub const fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub(crate) fn config(message: &str) -> Self {
        Self {
            source: Some(message.into()),
            kind: ErrorKind::Config,
        }
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.kind {
            ErrorKind::Config => f.write_str("configuration error: ")?,
            ErrorKind::Database => f.write_str("database error: ")?,
            ErrorKind::Discord => f.write_str("discord error: ")?,
            ErrorKind::NotFound => f.write_str("not found: ")?,
            ErrorKind::Roblox => f.write_str("roblox error: ")?,
        }
        match &self.source {
            Some(err) => Display::fmt(&err, f),
            None => f.write_str(""),
        }
    }
}

impl StdError for CoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| &**source as &(dyn StdError + 'static))
    }
}

impl From<DatabaseError> for CoreError {
    fn from(err: DatabaseError) -> Self {
        Self {
            source: Some(Box::new(err)),
            kind: ErrorKind::Database,
        }
    }
}

impl From<DiscordHttpError> for CoreError {
    fn from(err: DiscordHttpError) -> Self {
        Self {
            source: Some(Box::new(err)),
            kind: ErrorKind::Discord,
        }
    }
}

impl From<RobloxError> for CoreError {
    fn from(err: RobloxError) -> Self {
        Self {
            source: Some(Box::new(err)),
            kind: ErrorKind::Roblox,
        }
    }
}

impl From<DocumentError> for CoreError {
    fn from(err: DocumentError) -> Self {
        let kind = match err {
            DocumentError::SubGroupNotFound(_) => ErrorKind::NotFound,
            DocumentError::InvalidSuspensionWindow => ErrorKind::Config,
        };
        Self {
            source: Some(Box::new(err)),
            kind,
        }
    }
}
