use deadpool_postgres::{BuildError, PoolError};
use serde_json::Error as SerdeError;
use std::{
    error::Error as StdError,
    fmt::{Display, Formatter},
};
use tokio_postgres::Error as PostgresError;

#[derive(Debug)]
pub struct DatabaseError {
    pub(crate) source: Option<Box<dyn StdError + Send + Sync>>,
    pub(crate) kind: ErrorKind,
}

#[derive(Debug)]
pub enum ErrorKind {
    Build,
    Pool,
    Postgres,
    Serde,
}

impl DatabaseError {
    #[must_use]
    pub const fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    #[must_use]
    pub fn from_parts(kind: ErrorKind, source: Option<Box<dyn StdError + Send + Sync>>) -> Self {
        Self { source, kind }
    }
}

impl From<BuildError> for DatabaseError {
    fn from(value: BuildError) -> Self {
        DatabaseError {
            source: Some(Box::new(value)),
            kind: ErrorKind::Build,
        }
    }
}

impl From<PoolError> for DatabaseError {
    fn from(value: PoolError) -> Self {
        DatabaseError {
            source: Some(Box::new(value)),
            kind: ErrorKind::Pool,
        }
    }
}

impl From<PostgresError> for DatabaseError {
    fn from(value: PostgresError) -> Self {
        DatabaseError {
            source: Some(Box::new(value)),
            kind: ErrorKind::Postgres,
        }
    }
}

impl From<SerdeError> for DatabaseError {
    fn from(value: SerdeError) -> Self {
        DatabaseError {
            source: Some(Box::new(value)),
            kind: ErrorKind::Serde,
        }
    }
}

impl Display for DatabaseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ErrorKind::Build => write!(f, "pool build error - {:?}", self.source),
            ErrorKind::Postgres => write!(f, "postgres error - {:?}", self.source),
            ErrorKind::Pool => write!(f, "pool error - {:?}", self.source),
            ErrorKind::Serde => write!(f, "document (de)serialization error - {:?}", self.source),
        }
    }
}

impl StdError for DatabaseError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| &**source as &(dyn StdError + 'static))
    }
}
