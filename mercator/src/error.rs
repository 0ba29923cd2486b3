//! Error types used by the crate.

use thiserror::Error;

/// Mercator error type.
#[derive(Debug, Error)]
pub enum MercatorError {
    /// The operation requires an access credential, but none was provided.
    #[error("access credential is missing or empty")]
    InvalidCredential,
    /// Item not found.
    #[error("item not found")]
    NotFound,
    /// The backend is not reachable.
    #[error("connection failed: {0}")]
    Connection(String),
    /// Error interacting with a tile archive.
    #[error("archive error: {0}")]
    Archive(String),
    /// Error reading/writing data to the FS.
    #[error("failed to read file")]
    FsIo(#[from] std::io::Error),
    /// Generic error - details are inside.
    #[error("{0}")]
    Other(String),
}

impl From<rusqlite::Error> for MercatorError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Archive(value.to_string())
    }
}
