use std::io;
use thiserror::Error;

/// Enum for remote client errors
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The remote reports no resource at the given path
    #[error("Resource not found: {0}")]
    NotFound(String),
    /// A resource already occupies the path and overwrite was not requested
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),
    /// The request conflicts with the remote state, e.g. the parent directory is missing
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Any HTTP status other than the one the operation requires
    #[error("Unexpected HTTP status {0}")]
    UnexpectedStatus(u16),
    /// Any errors related to I/O
    #[error("I/O: {0}")]
    IO(String),
    /// The remote resource document could not be decoded
    #[error("Decode: {0}")]
    Decode(String),
    /// The backend does not provide the requested capability
    #[error("Unsupported: {0}")]
    Unsupported(String),
    /// Occurs when the remote behaves in a way the client does not expect
    #[error("{0}")]
    UnexpectedBehavior(String),
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::IO(error.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}
