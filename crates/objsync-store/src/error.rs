//! Error types for the store module.

use objsync_core::{CoreError, ObjectId};
use thiserror::Error;

/// Errors that can occur during store operations.
///
/// [`StoreError::NotFound`] signals absence and is matched by variant, never
/// by message. Every other variant is a store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No object or record under this identifier.
    #[error("not found: {0}")]
    NotFound(ObjectId),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Object encoding/decoding error.
    #[error("encoding error: {0}")]
    Encoding(#[from] CoreError),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure (lock poisoning, task join, injected faults).
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether this error only signals absence.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinguishable() {
        assert!(StoreError::NotFound(ObjectId::from("a")).is_not_found());
        // A failure whose message mentions "not found" is still a failure.
        assert!(!StoreError::Backend("not found".into()).is_not_found());
    }
}
