//! In-memory implementations of the store traits.
//!
//! Same semantics as the SQLite backend, no persistence. Used by tests and
//! by callers that keep replicas in process.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use objsync_core::{Blake3Hasher, ContentHasher, ConvergenceRecord, Object, ObjectId};

use crate::error::{Result, StoreError};
use crate::traits::{ObjectStore, RecordStore};

fn read_lock<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|e| StoreError::Backend(format!("lock poisoned: {}", e)))
}

fn write_lock<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|e| StoreError::Backend(format!("lock poisoned: {}", e)))
}

/// In-memory object store.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryObjectStore {
    name: String,
    hasher: Arc<dyn ContentHasher>,
    objects: RwLock<BTreeMap<ObjectId, Object>>,
}

impl MemoryObjectStore {
    /// Create an empty store hashing with [`Blake3Hasher`].
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_hasher(name, Arc::new(Blake3Hasher))
    }

    /// Create an empty store with a custom hasher.
    pub fn with_hasher(name: impl Into<String>, hasher: Arc<dyn ContentHasher>) -> Self {
        Self {
            name: name.into(),
            hasher,
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored objects.
    pub fn len(&self) -> Result<usize> {
        Ok(read_lock(&self.objects)?.len())
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn set(&self, object: &Object) -> Result<()> {
        let stored = object.deep_copy().sealed(self.hasher.as_ref());
        write_lock(&self.objects)?.insert(stored.id.clone(), stored);
        Ok(())
    }

    async fn get(&self, id: &ObjectId) -> Result<Object> {
        read_lock(&self.objects)?
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn get_all(&self) -> Result<Vec<Object>> {
        Ok(read_lock(&self.objects)?.values().cloned().collect())
    }

    async fn delete(&self, id: &ObjectId) -> Result<()> {
        write_lock(&self.objects)?.remove(id);
        Ok(())
    }
}

/// In-memory convergence record store.
pub struct MemoryRecordStore {
    records: RwLock<BTreeMap<ObjectId, ConvergenceRecord>>,
}

impl MemoryRecordStore {
    /// Create an empty record store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> Result<usize> {
        Ok(read_lock(&self.records)?.len())
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn set(&self, record: &ConvergenceRecord) -> Result<()> {
        write_lock(&self.records)?.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, id: &ObjectId) -> Result<ConvergenceRecord> {
        read_lock(&self.records)?
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn get_all(&self) -> Result<Vec<ConvergenceRecord>> {
        Ok(read_lock(&self.records)?.values().cloned().collect())
    }

    async fn delete(&self, id: &ObjectId) -> Result<()> {
        write_lock(&self.records)?.remove(id);
        Ok(())
    }
}
