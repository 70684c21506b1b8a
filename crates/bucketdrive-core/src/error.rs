//! Error taxonomy for drive operations.
//!
//! Every fallible operation on the drive returns [`DriveResult`]. Backend
//! errors are carried verbatim: when the response envelope contains an
//! `error` field, that JSON value is handed back to the caller unwrapped,
//! exactly as the backend reported it.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type DriveResult<T> = Result<T, DriveError>;

/// Failure modes of a drive operation.
#[derive(Debug, Error)]
pub enum DriveError {
    /// The backend answered with an `error` field in its response envelope.
    /// The value is propagated verbatim, never wrapped or rephrased.
    #[error("backend error: {0}")]
    Backend(serde_json::Value),

    /// The HTTP round trip itself failed (connection, timeout, non-JSON
    /// body). Surfaced to the caller, never swallowed.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response parsed as JSON but did not match the expected envelope
    /// shape (missing `type`/`content`, unknown entry type, wrong payload).
    #[error("malformed backend response: {0}")]
    Malformed(String),

    /// File content could not be decoded (invalid base64 or non-UTF-8 bytes).
    #[error("content decode failed: {0}")]
    Decode(String),

    /// A logical path failed validation.
    #[error("invalid drive path: {0}")]
    InvalidPath(String),

    /// The drive was disposed; no further operations are accepted.
    #[error("drive has been disposed")]
    Disposed,
}

impl DriveError {
    /// Shorthand for a [`DriveError::Malformed`] with a formatted message.
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        DriveError::Malformed(msg.into())
    }
}
