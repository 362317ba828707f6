//! Error types for the replicator.

use objsync_sync::SyncError;
use thiserror::Error;

/// Errors that can occur during replicator operations.
#[derive(Debug, Error)]
pub enum ReplicatorError {
    /// A sync run failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Repeated syncs kept producing work.
    #[error("replicas did not converge after {rounds} rounds")]
    NotConverged { rounds: usize },
}

impl From<objsync_store::StoreError> for ReplicatorError {
    fn from(e: objsync_store::StoreError) -> Self {
        ReplicatorError::Sync(SyncError::Store(e))
    }
}

/// Result type for replicator operations.
pub type Result<T> = std::result::Result<T, ReplicatorError>;
