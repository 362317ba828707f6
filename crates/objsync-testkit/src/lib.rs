//! # objsync Testkit
//!
//! Testing utilities for objsync.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Encoding vectors**: Known objects with their expected canonical bytes
//! - **Generators**: Proptest strategies for objects and edit histories
//! - **Fixtures**: A ready-made pair of replicas, plus a store that fails on demand
//!
//! ## Encoding Vectors
//!
//! ```rust
//! use objsync_testkit::vectors::{all_vectors, verify_all_vectors};
//!
//! assert!(!all_vectors().is_empty());
//! verify_all_vectors().unwrap();
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use objsync_testkit::generators::history;
//!
//! proptest! {
//!     #[test]
//!     fn any_history_converges(edits in history(20)) {
//!         // apply `edits`, sync, verify
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use objsync_store::ObjectStore;
//! use objsync_testkit::fixtures::{object, ReplicaFixture};
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! rt.block_on(async {
//!     let fixture = ReplicaFixture::new();
//!     fixture.local.set(&object("a", 1, "hello")).await.unwrap();
//!     fixture.sync().await.unwrap();
//!     assert!(fixture.verify().await.unwrap().is_converged());
//! });
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{add_objects, assert_replica, object, FailingStore, ReplicaFixture};
pub use generators::{apply_history, history, Mutation};
pub use vectors::{all_vectors, verify_all_vectors, EncodingVector};
