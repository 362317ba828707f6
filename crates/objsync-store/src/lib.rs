//! # objsync Store
//!
//! Storage capabilities for objsync. The sync engine only ever talks to the
//! [`ObjectStore`] and [`RecordStore`] traits, so any keyed container that
//! can get, set, list and delete by identifier can take part in a sync.
//!
//! ## Key Types
//!
//! - [`ObjectStore`] - One replica: objects keyed by [`ObjectId`](objsync_core::ObjectId)
//! - [`RecordStore`] - The shared convergence records
//! - [`MemoryObjectStore`] / [`MemoryRecordStore`] - In-memory backends
//! - [`SqliteObjectStore`] / [`SqliteRecordStore`] - SQLite backends over one [`Database`]
//! - [`StoreError`] - Errors, with a typed [`StoreError::NotFound`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use objsync_store::{Database, SqliteObjectStore, SqliteRecordStore};
//!
//! fn example() -> objsync_store::Result<()> {
//!     // Both replicas and the records can share one database file.
//!     let db = Database::open("replicas.db")?;
//!     let local = SqliteObjectStore::new(db.clone(), "local");
//!     let remote = SqliteObjectStore::new(db.clone(), "remote");
//!     let records = SqliteRecordStore::new(db);
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Stores own the hash**: `set` recomputes the content hash with the
//!   store's [`ContentHasher`](objsync_core::ContentHasher).
//! - **Typed absence**: `get` fails with `NotFound`; callers that want a
//!   presence flag use [`StoreExt::try_get`] / [`RecordStoreExt::try_get`].
//! - **Idempotent deletes**: deleting a missing identifier succeeds.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::{MemoryObjectStore, MemoryRecordStore};
pub use sqlite::{Database, SqliteObjectStore, SqliteRecordStore};
pub use traits::{ObjectStore, RecordStore, RecordStoreExt, StoreExt};
