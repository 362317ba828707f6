//! # objsync
//!
//! Keeps two independently mutable object stores in step.
//!
//! ## Overview
//!
//! Each replica is an [`ObjectStore`]: a keyed container of objects whose
//! content hashes the store computes itself. A [`RecordStore`] remembers,
//! per identifier, the hashes both replicas held when they last agreed.
//! Comparing each replica against that record tells a local edit from a
//! remote one, and a delete from an add.
//!
//! - **Adds** on either side are copied to the other
//! - **Deletes** on either side are propagated
//! - **Conflicting edits** are settled by last-write-wins on `modified_at`,
//!   with a deterministic [`TieBreak`] for equal timestamps
//!
//! ## Usage
//!
//! ```rust,no_run
//! use objsync::{Object, Replicator, ReplicatorConfig};
//! use objsync::store::{MemoryObjectStore, MemoryRecordStore, ObjectStore};
//!
//! async fn example() -> objsync::Result<()> {
//!     let replicator = Replicator::new(
//!         MemoryObjectStore::new("local"),
//!         MemoryObjectStore::new("remote"),
//!         MemoryRecordStore::new(),
//!         ReplicatorConfig::default(),
//!     );
//!
//!     replicator
//!         .local()
//!         .set(&Object::new("greeting", 1_700_000_000_000, b"hello".to_vec()))
//!         .await?;
//!
//!     let report = replicator.sync().await?;
//!     assert_eq!(report.written_remote, 1);
//!     assert!(replicator.verify().await?.is_converged());
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `objsync::core` - Objects, records, intents, discovery, conflict resolution
//! - `objsync::store` - Store traits, in-memory and SQLite backends
//! - `objsync::sync` - Sync runs, apply phase, convergence verification

pub mod error;
pub mod replicator;

// Re-export component crates
pub use objsync_core as core;
pub use objsync_store as store;
pub use objsync_sync as sync;

// Re-export main types for convenience
pub use error::{ReplicatorError, Result};
pub use replicator::{Replicator, ReplicatorConfig};

// Re-export commonly used types
pub use objsync_core::{
    Blake3Hasher, ChangeIntent, ContentHash, ContentHasher, ConvergenceRecord, Discovery, Object,
    ObjectId, Replica, TieBreak,
};
pub use objsync_store::{ObjectStore, RecordStore, StoreError};
pub use objsync_sync::{ConvergenceResult, SyncConfig, SyncError, SyncReport};
