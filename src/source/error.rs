//! Source-specific error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors raised by query executors and statement translators.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The statement catalog file could not be read.
    #[error("failed to read statement catalog {path}: {source}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The statement catalog file is not valid JSON.
    #[error("failed to parse statement catalog {path}: {source}")]
    CatalogParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No statement with this name is known.
    #[error("statement not found: {0}")]
    StatementNotFound(String),

    /// Unknown SQL dialect name.
    #[error("unsupported dialect: {0}")]
    UnsupportedDialect(String),

    /// The database could not be opened.
    #[error("database connection failed: {0}")]
    ConnectionFailed(String),

    /// The query failed on the database side.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// The blocking query task panicked or was cancelled.
    #[error("query task failed: {0}")]
    TaskFailed(String),
}

impl From<rusqlite::Error> for SourceError {
    fn from(err: rusqlite::Error) -> Self {
        Self::QueryFailed(err.to_string())
    }
}

impl From<tokio::task::JoinError> for SourceError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskFailed(err.to_string())
    }
}
