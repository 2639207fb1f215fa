//! # Storage Errors
//!
//! `DataAccessError` is the only error kind that crosses the DAO contract.
//! Driver, file and serializer failures are converted into it at the backend
//! boundary. `BackendInitError` covers startup wiring and is fatal.

use std::any::Any;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single data access operation
#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("{entity} with id '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("malformed {entity} identifier '{id}'")]
    MalformedId { entity: &'static str, id: String },

    #[error("storage file {path} could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not map {entity} record: {message}")]
    Serialization { entity: &'static str, message: String },

    #[error("database operation failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("document store operation failed: {0}")]
    Document(#[from] mongodb::error::Error),

    /// The original failure stays primary; the rollback failure rides along
    #[error("{original} (rollback also failed: {rollback})")]
    RollbackFailed {
        #[source]
        original: Box<DataAccessError>,
        rollback: sqlx::Error,
    },

    #[error("unexpected storage failure: {0}")]
    Unexpected(String),
}

impl DataAccessError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { entity, id: id.into() }
    }

    pub fn malformed_id(entity: &'static str, id: impl Into<String>) -> Self {
        Self::MalformedId { entity, id: id.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn serialization(entity: &'static str, message: impl ToString) -> Self {
        Self::Serialization { entity, message: message.to_string() }
    }

    /// Convert a caught panic payload into an error
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "panic with non-string payload".to_string()
        };
        Self::Unexpected(message)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Failure while wiring a storage backend at startup
#[derive(Debug, Error)]
pub enum BackendInitError {
    #[error("missing configuration entry '{0}'")]
    MissingConfig(String),

    #[error("invalid configuration entry '{key}': {message}")]
    InvalidConfig { key: String, message: String },

    #[error("could not read configuration file {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("could not prepare storage directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not connect to document store: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("could not connect to relational database: {0}")]
    Postgres(#[from] sqlx::Error),
}

impl BackendInitError {
    pub fn invalid(key: &str, message: impl ToString) -> Self {
        Self::InvalidConfig { key: key.to_string(), message: message.to_string() }
    }
}
