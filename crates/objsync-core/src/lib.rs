//! # objsync Core
//!
//! Pure primitives for objsync: objects, convergence records, change intents,
//! the discovery classifier and the Last-Write-Wins conflict resolver.
//!
//! This crate contains no I/O and no storage. Discovery works over snapshots
//! that the caller has already read from the stores, which keeps the
//! three-way diff deterministic and testable without a runtime.
//!
//! ## Key Types
//!
//! - [`Object`] - A replicated value with its store-computed [`ContentHash`]
//! - [`ConvergenceRecord`] - The hashes both replicas held when they last agreed
//! - [`ChangeIntent`] - A single store mutation produced by [`discover`]
//! - [`ContentHasher`] - The injected content digest, [`Blake3Hasher`] by default
//!
//! ## Discovery
//!
//! ```rust
//! use objsync_core::{discover, Blake3Hasher, Object, TieBreak};
//!
//! let hasher = Blake3Hasher;
//! let local = vec![Object::new("a", 1000, b"hello".to_vec()).sealed(&hasher)];
//!
//! let discovery = discover(&local, &[], &[], TieBreak::default());
//! assert_eq!(discovery.intents.len(), 1);
//! ```

pub mod canonical;
pub mod discovery;
pub mod error;
pub mod hash;
pub mod intent;
pub mod object;
pub mod resolve;
pub mod types;

pub use canonical::{canonical_object_bytes, decode_object_bytes};
pub use discovery::{discover, Discovery};
pub use error::CoreError;
pub use hash::{Blake3Hasher, ContentHash, ContentHasher};
pub use intent::{ChangeIntent, IntentKind};
pub use object::{ConvergenceRecord, Object};
pub use resolve::{pick_winner, resolve_conflict, ConflictOutcome, TieBreak};
pub use types::{ObjectId, Replica};
