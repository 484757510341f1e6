//! Error types for feedsync.

use thiserror::Error;

/// Common error type for feedsync.
#[derive(Error, Debug)]
pub enum FeedsyncError {
    /// Feed could not be fetched or parsed.
    ///
    /// Aborts the pass for that feed before anything is written.
    #[error("feed error: {0}")]
    Feed(String),

    /// Record store search failed.
    ///
    /// Without the candidate set neither create-vs-update nor staleness can
    /// be decided, so the pass for that feed is aborted.
    #[error("search error: {0}")]
    Search(String),

    /// Record store create, update or archive failed.
    ///
    /// Isolated to the single record; the pass continues.
    #[error("write error: {0}")]
    Write(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error.
    #[error("validation error: {0}")]
    Validation(String),
}

impl FeedsyncError {
    /// Returns true if this error only affects a single record.
    pub fn is_write(&self) -> bool {
        matches!(self, FeedsyncError::Write(_))
    }
}

/// Result type alias for feedsync operations.
pub type Result<T> = std::result::Result<T, FeedsyncError>;
