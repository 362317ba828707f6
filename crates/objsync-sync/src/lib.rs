//! # objsync Sync
//!
//! Reconciles two replicas against their convergence records.
//!
//! ## Overview
//!
//! A sync run has two phases:
//!
//! 1. **Discover**: snapshot both replicas and all records, classify every
//!    identifier, emit [`ChangeIntent`](objsync_core::ChangeIntent)s.
//! 2. **Apply**: execute the intents in order, stopping at the first error.
//!
//! ## Key Properties
//!
//! - **Convergent**: after a successful run both replicas hold the same
//!   identifiers with the same hashes, and every record is settled
//! - **Idempotent**: a second run on converged replicas does nothing
//! - **Resumable**: a failed run can simply be repeated
//!
//! ## Usage
//!
//! ```rust,no_run
//! use objsync_store::{MemoryObjectStore, MemoryRecordStore};
//! use objsync_sync::{sync, SyncConfig};
//!
//! async fn example() -> objsync_sync::Result<()> {
//!     let local = MemoryObjectStore::new("local");
//!     let remote = MemoryObjectStore::new("remote");
//!     let records = MemoryRecordStore::new();
//!
//!     let report = sync(&local, &remote, &records, &SyncConfig::default()).await?;
//!     println!("applied {} intents", report.applied);
//!     Ok(())
//! }
//! ```

pub mod convergence;
pub mod error;
pub mod protocol;
pub mod reconcile;

pub use convergence::{
    compute_replica_digest, digest_objects, verify_convergence, ConvergenceResult,
};
pub use error::{Result, SyncError};
pub use protocol::{plan, sync, sync_ids, SyncConfig, SyncReport};
pub use reconcile::apply;
