//! Error types for the retrieval pipeline.
//!
//! Library modules return [`Result<T>`]; the CLI command modules wrap these
//! in `anyhow` with additional context. No variant is retried automatically;
//! a failed provider call is surfaced with its batch index.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing credential, unknown provider, or an invalid setting.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The embedding provider failed or returned a misaligned response.
    #[error("Provider error in batch {batch}: {message}")]
    Provider { batch: usize, message: String },

    /// Vectors in one index (or a query) disagree on dimensionality.
    #[error("Schema mismatch for {context}: expected dimension {expected}, got {actual}")]
    SchemaMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// The schema text could not be parsed.
    #[error("Schema parse error: {0}")]
    SchemaParse(String),

    /// A persisted index line is not a valid record.
    #[error("Invalid index record at line {line}: {message}")]
    InvalidRecord { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn provider(batch: usize, message: impl Into<String>) -> Self {
        Error::Provider {
            batch,
            message: message.into(),
        }
    }

    /// Attach a batch index to a provider error; other variants pass through.
    pub(crate) fn with_batch(self, batch: usize) -> Self {
        match self {
            Error::Provider { message, .. } => Error::Provider { batch, message },
            other => other,
        }
    }
}
