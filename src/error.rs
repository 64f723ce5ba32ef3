//! Custom error types for scholar-ingest.
//!
//! Degraded data is never an error here: missing fields become placeholders
//! and issues. Errors are reserved for transport exhaustion, configuration,
//! storage and I/O.

use thiserror::Error;

/// Main error type for scholar-ingest operations.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Non-2xx response or transport failure after all retries.
    ///
    /// Transport-level failures (DNS, connect, body read) carry status `-1`.
    #[error("HTTP error {status}: {message}")]
    Http {
        /// HTTP status code, `-1` for transport failures
        status: i32,
        /// Response body or underlying error message
        message: String,
    },

    /// Payload could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// SQLite error
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl IngestError {
    /// HTTP status carried by this error, if it came from the transport.
    pub fn http_status(&self) -> Option<i32> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias using `IngestError`
pub type Result<T> = std::result::Result<T, IngestError>;
