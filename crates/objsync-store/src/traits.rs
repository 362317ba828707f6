//! Store traits: the abstract interfaces the sync engine runs against.
//!
//! A replica is anything that implements [`ObjectStore`]; the shared
//! convergence side-channel is anything that implements [`RecordStore`].
//! The two are independent: nothing requires records to live next to
//! either replica.

use async_trait::async_trait;
use objsync_core::{ConvergenceRecord, Object, ObjectId};

use crate::error::Result;

/// One replica: a keyed container of objects.
///
/// # Design Notes
///
/// - **Hash ownership**: `set` stores the object under a hash the store
///   recomputes itself; whatever hash the caller supplied is ignored.
/// - **Typed absence**: `get` on a missing identifier returns
///   [`StoreError::NotFound`](crate::StoreError::NotFound).
/// - **Idempotent delete**: deleting a missing identifier is not an error.
/// - **Independence**: stored objects never share buffers with the caller.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Display name of this replica, used in logs.
    fn name(&self) -> &str;

    /// Insert or replace an object.
    async fn set(&self, object: &Object) -> Result<()>;

    /// Get an object by identifier.
    async fn get(&self, id: &ObjectId) -> Result<Object>;

    /// Snapshot every object. Order is unspecified.
    async fn get_all(&self) -> Result<Vec<Object>>;

    /// Remove an object.
    async fn delete(&self, id: &ObjectId) -> Result<()>;
}

/// The convergence-record side-channel.
///
/// Same contract as [`ObjectStore`] minus hashing: records are stored as
/// given.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert or replace a record.
    async fn set(&self, record: &ConvergenceRecord) -> Result<()>;

    /// Get the record for an identifier.
    async fn get(&self, id: &ObjectId) -> Result<ConvergenceRecord>;

    /// Snapshot every record. Order is unspecified.
    async fn get_all(&self) -> Result<Vec<ConvergenceRecord>>;

    /// Remove a record.
    async fn delete(&self, id: &ObjectId) -> Result<()>;
}

/// Extension trait for object stores.
pub trait StoreExt: ObjectStore {
    /// Get an object, mapping `NotFound` to `None`.
    ///
    /// Any other error is still an error.
    fn try_get(
        &self,
        id: &ObjectId,
    ) -> impl std::future::Future<Output = Result<Option<Object>>> + Send;
}

impl<S: ObjectStore + ?Sized> StoreExt for S {
    async fn try_get(&self, id: &ObjectId) -> Result<Option<Object>> {
        match self.get(id).await {
            Ok(object) => Ok(Some(object)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Extension trait for record stores.
pub trait RecordStoreExt: RecordStore {
    /// Get a record, mapping `NotFound` to `None`.
    fn try_get(
        &self,
        id: &ObjectId,
    ) -> impl std::future::Future<Output = Result<Option<ConvergenceRecord>>> + Send;
}

impl<S: RecordStore + ?Sized> RecordStoreExt for S {
    async fn try_get(&self, id: &ObjectId) -> Result<Option<ConvergenceRecord>> {
        match self.get(id).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
