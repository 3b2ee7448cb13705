//! Job error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::discovery::AnalysisError;
use crate::snapshot::ExtractError;

/// Errors that end a scan job. Every variant is fatal.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Invalid input or options, or an unusable output directory.
    #[error("invalid job configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// The analysis task panicked or was cancelled.
    #[error("analysis task failed: {0}")]
    Task(String),

    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write results {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<tokio::task::JoinError> for ScanError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

impl ScanError {
    /// The error message followed by each underlying cause.
    pub fn chain(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let message = cause.to_string();
            if messages.last() != Some(&message) {
                messages.push(message);
            }
            source = cause.source();
        }
        messages
    }
}
