//! Error Log Store Port - Append-only persistence for irrecoverable replies.
//!
//! The store must outlive a single wizard run. A failed append is always
//! reported to the caller; implementations never drop entries silently.

use async_trait::async_trait;

use crate::domain::wizard::ErrorLogEntry;

/// Port for the append-only error log.
#[async_trait]
pub trait ErrorLogStore: Send + Sync {
    /// Appends one entry at the end of the log.
    async fn append(&self, entry: ErrorLogEntry) -> Result<(), ErrorLogError>;

    /// Returns every entry, oldest first.
    async fn read_all(&self) -> Result<Vec<ErrorLogEntry>, ErrorLogError>;
}

/// Error log storage errors.
#[derive(Debug, thiserror::Error)]
pub enum ErrorLogError {
    /// The backing store cannot be reached or written.
    #[error("error log unavailable: {0}")]
    Unavailable(String),

    /// Entries could not be serialized.
    #[error("error log serialization failed: {0}")]
    Serialization(String),

    /// Stored data exists but cannot be read back as a log.
    #[error("error log corrupted: {0}")]
    Corrupted(String),
}

impl ErrorLogError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

impl From<std::io::Error> for ErrorLogError {
    fn from(err: std::io::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for ErrorLogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
