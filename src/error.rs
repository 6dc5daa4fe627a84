//! Error types for ledger-dl
//!
//! Errors are split along the lines of how far they are allowed to travel:
//! - [`Error`] escapes to the caller and ends a run (configuration, ledger access)
//! - [`FetchError`] is contained inside the worker pool and becomes a failed outcome
//! - [`NotifyError`] is produced by notifiers and discarded by their callers

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for ledger-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ledger-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The environment variable that caused the error (e.g., "LEDGER_DL_BATCH_SIZE")
        key: Option<String>,
    },

    /// Ledger operation failed
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Local file could not be opened or created
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being opened
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// HTTP client could not be set up
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl Error {
    /// Build a configuration error for the given environment variable
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Ledger-related errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Failed to connect to the ledger database
    #[error("failed to connect to ledger: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Failure to transfer a single item
///
/// Every variant collapses to a failed outcome in the worker pool; the variants exist
/// for logging and for deciding whether a bounded retry is worthwhile.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The remote end has no item at this path
    #[error("remote item not found: {0}")]
    NotFound(String),

    /// The remote end answered with a non-success status
    #[error("remote returned status {status} for {path}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Remote path that was requested
        path: String,
    },

    /// Transport-level failure (connect, timeout, reset)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// No progress from the remote end within the stall timeout
    #[error("transfer of {path} stalled for {after:?}")]
    Stalled {
        /// Remote path that was requested
        path: String,
        /// How long the transfer waited without progress
        after: Duration,
    },

    /// Writing the local copy failed
    #[error("local write failed for {path}: {source}")]
    Io {
        /// Local path being written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The item name cannot be mapped to a path under the destination root
    #[error("invalid item name {0:?}")]
    InvalidName(String),
}

/// Notification delivery failure
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Request could not be sent or timed out
    #[error("failed to send notification: {0}")]
    Send(#[from] reqwest::Error),

    /// Sink answered with a non-success status
    #[error("notification sink returned status {0}")]
    Status(u16),
}
