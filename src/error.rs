//! Centralized error types for threadarchive.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::url::UrlError;

/// All errors produced by the threadarchive library.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The mailbox URL could not be understood.
    #[error("Invalid mailbox URL: {0}")]
    InvalidUrl(#[from] UrlError),

    /// The mail server could not be reached.
    #[error("Could not connect to {host}: {reason}")]
    Connect { host: String, reason: String },

    /// The server rejected our credentials.
    #[error("Login to {host} failed: {reason}")]
    Login { host: String, reason: String },

    /// The server cannot group messages into threads.
    #[error("IMAP server {host} does not support UID THREAD (RFC 5256)")]
    ThreadUnsupported { host: String },

    /// The `* THREAD` response did not have the expected shape.
    #[error("Malformed THREAD response: {0}")]
    ThreadResponse(String),

    /// Any other IMAP protocol error.
    #[error("IMAP error: {0}")]
    Imap(String),

    /// A MIME decoding error.
    #[error("MIME decoding error: {0}")]
    Mime(String),

    /// A document could not be serialized.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for `Result<T, ArchiveError>`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

impl ArchiveError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Kept as text so `ArchiveError` stays `Send + Sync`.
impl From<imap::Error> for ArchiveError {
    fn from(e: imap::Error) -> Self {
        Self::Imap(e.to_string())
    }
}
