//! Test fixtures and helpers.
//!
//! Common setup code for sync tests: a pair of in-memory replicas with
//! their record store, object builders, and a store wrapper that fails on
//! command.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;

use objsync::{Replicator, ReplicatorConfig};
use objsync_core::{ConvergenceRecord, Discovery, Object, ObjectId, Replica};
use objsync_store::{MemoryObjectStore, MemoryRecordStore, ObjectStore, StoreError};
use objsync_sync::{ConvergenceResult, SyncConfig, SyncReport};

/// Two in-memory replicas and their records.
pub struct ReplicaFixture {
    pub local: MemoryObjectStore,
    pub remote: MemoryObjectStore,
    pub records: MemoryRecordStore,
    pub config: SyncConfig,
}

impl ReplicaFixture {
    /// Empty replicas named "local" and "remote".
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    /// Empty replicas synced with `config`.
    pub fn with_config(config: SyncConfig) -> Self {
        Self {
            local: MemoryObjectStore::new("local"),
            remote: MemoryObjectStore::new("remote"),
            records: MemoryRecordStore::new(),
            config,
        }
    }

    /// The replica on `side`.
    pub fn replica(&self, side: Replica) -> &MemoryObjectStore {
        match side {
            Replica::Local => &self.local,
            Replica::Remote => &self.remote,
        }
    }

    /// Run one sync.
    pub async fn sync(&self) -> objsync_sync::Result<SyncReport> {
        objsync_sync::sync(&self.local, &self.remote, &self.records, &self.config).await
    }

    /// Discover without applying.
    pub async fn plan(&self) -> objsync_sync::Result<Discovery> {
        objsync_sync::plan(&self.local, &self.remote, &self.records, &self.config).await
    }

    /// Check convergence of replicas and records.
    pub async fn verify(&self) -> objsync_sync::Result<ConvergenceResult> {
        objsync_sync::verify_convergence(&self.local, &self.remote, &self.records).await
    }

    /// Snapshot the record store.
    pub async fn records(&self) -> objsync_store::Result<Vec<ConvergenceRecord>> {
        use objsync_store::RecordStore;
        self.records.get_all().await
    }

    /// Hand the stores to a [`Replicator`].
    pub fn into_replicator(
        self,
    ) -> Replicator<MemoryObjectStore, MemoryObjectStore, MemoryRecordStore> {
        let config = ReplicatorConfig::default().with_sync(self.config);
        Replicator::new(self.local, self.remote, self.records, config)
    }
}

impl Default for ReplicaFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an unsealed object with a UTF-8 value.
pub fn object(id: &str, modified_at: i64, value: &str) -> Object {
    Object::new(id, modified_at, value.as_bytes().to_vec())
}

/// Add `count` objects with random identifiers and values to `store`.
///
/// Returns the objects as the store holds them, hashes included.
pub async fn add_objects<S: ObjectStore + ?Sized>(
    store: &S,
    count: usize,
) -> objsync_store::Result<Vec<Object>> {
    let mut added = Vec::with_capacity(count);

    for _ in 0..count {
        let object = Object::new(random_string(16), now_millis(), random_string(32).into_bytes());
        store.set(&object).await?;
        added.push(store.get(&object.id).await?);
    }

    Ok(added)
}

/// Assert `store` holds exactly `expected`, compared by id, timestamp and value.
///
/// # Panics
///
/// On any difference, naming the store.
pub async fn assert_replica<S: ObjectStore + ?Sized>(store: &S, expected: &[Object]) {
    let mut actual: Vec<(ObjectId, i64, Vec<u8>)> = store
        .get_all()
        .await
        .unwrap_or_else(|e| panic!("{}: get_all failed: {}", store.name(), e))
        .into_iter()
        .map(|o| (o.id, o.modified_at, o.value.to_vec()))
        .collect();
    let mut expected: Vec<(ObjectId, i64, Vec<u8>)> = expected
        .iter()
        .map(|o| (o.id.clone(), o.modified_at, o.value.to_vec()))
        .collect();

    actual.sort();
    expected.sort();

    assert_eq!(actual, expected, "{} does not hold the expected objects", store.name());
}

/// Object store wrapper that injects failures.
///
/// Writes (set and delete) succeed until the armed budget runs out, then
/// fail with [`StoreError::Backend`]. Reads can be failed separately.
pub struct FailingStore<S> {
    inner: S,
    writes_left: AtomicUsize,
    fail_reads: AtomicBool,
}

impl<S: ObjectStore> FailingStore<S> {
    /// Wrap `inner` without any failures armed.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            writes_left: AtomicUsize::new(usize::MAX),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Wrap `inner`, allowing `writes` writes before failing.
    pub fn fail_after(inner: S, writes: usize) -> Self {
        let store = Self::new(inner);
        store.arm(writes);
        store
    }

    /// Allow `writes` more writes, then fail.
    pub fn arm(&self, writes: usize) {
        self.writes_left.store(writes, Ordering::SeqCst);
    }

    /// Stop failing writes.
    pub fn disarm(&self) {
        self.writes_left.store(usize::MAX, Ordering::SeqCst);
    }

    /// Make `get` and `get_all` fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn injected(&self, op: &str) -> StoreError {
        StoreError::Backend(format!("injected {} failure in {}", op, self.inner.name()))
    }

    fn take_write(&self) -> objsync_store::Result<()> {
        self.writes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
                usize::MAX => Some(n),
                n => n.checked_sub(1),
            })
            .map(|_| ())
            .map_err(|_| self.injected("write"))
    }

    fn check_read(&self) -> objsync_store::Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(self.injected("read"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for FailingStore<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn set(&self, object: &Object) -> objsync_store::Result<()> {
        self.take_write()?;
        self.inner.set(object).await
    }

    async fn get(&self, id: &ObjectId) -> objsync_store::Result<Object> {
        self.check_read()?;
        self.inner.get(id).await
    }

    async fn get_all(&self) -> objsync_store::Result<Vec<Object>> {
        self.check_read()?;
        self.inner.get_all().await
    }

    async fn delete(&self, id: &ObjectId) -> objsync_store::Result<()> {
        self.take_write()?;
        self.inner.delete(id).await
    }
}

fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
