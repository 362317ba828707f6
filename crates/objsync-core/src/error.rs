//! Error types for objsync Core.

use thiserror::Error;

/// Errors from the pure core: hashing, encoding and decoding.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid content hash: {0}")]
    InvalidHash(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("malformed object: {0}")]
    MalformedObject(String),
}

impl From<hex::FromHexError> for CoreError {
    fn from(e: hex::FromHexError) -> Self {
        CoreError::InvalidHash(e.to_string())
    }
}
