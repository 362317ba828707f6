//! The apply phase: turn change intents into store mutations.
//!
//! Intents are applied one at a time, in order. The first failure stops
//! the batch and is returned; nothing already applied is rolled back.
//! Every intent is idempotent, so re-running discovery and apply after a
//! failure picks up where the failed run stopped.

use objsync_core::{ChangeIntent, Replica};
use objsync_store::{ObjectStore, RecordStore};

use crate::error::Result;

/// Apply `intents` in order against the three stores.
///
/// Returns the number of intents applied, which is `intents.len()` on
/// success.
pub async fn apply<L, R, S>(
    intents: &[ChangeIntent],
    local: &L,
    remote: &R,
    records: &S,
) -> Result<usize>
where
    L: ObjectStore + ?Sized,
    R: ObjectStore + ?Sized,
    S: RecordStore + ?Sized,
{
    for (applied, intent) in intents.iter().enumerate() {
        tracing::debug!(
            step = applied + 1,
            total = intents.len(),
            local = local.name(),
            remote = remote.name(),
            "applying {}",
            intent
        );

        if let Err(e) = apply_one(intent, local, remote, records).await {
            tracing::debug!(applied, error = %e, "apply stopped");
            return Err(e);
        }
    }

    Ok(intents.len())
}

async fn apply_one<L, R, S>(intent: &ChangeIntent, local: &L, remote: &R, records: &S) -> Result<()>
where
    L: ObjectStore + ?Sized,
    R: ObjectStore + ?Sized,
    S: RecordStore + ?Sized,
{
    match intent {
        ChangeIntent::WriteObject {
            target,
            object,
            record,
        } => {
            // The target must not share the source replica's buffer.
            let copy = object.deep_copy();
            match target {
                Replica::Local => local.set(&copy).await?,
                Replica::Remote => remote.set(&copy).await?,
            }
            records.set(record).await?;
        }
        ChangeIntent::DeleteObject { target, id } => {
            match target {
                Replica::Local => local.delete(id).await?,
                Replica::Remote => remote.delete(id).await?,
            }
            records.delete(id).await?;
        }
        ChangeIntent::WriteRecord { record } => records.set(record).await?,
        ChangeIntent::DeleteRecord { id } => records.delete(id).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use objsync_core::{Blake3Hasher, ContentHash, ConvergenceRecord, Object, ObjectId};
    use objsync_store::{MemoryObjectStore, MemoryRecordStore, StoreError};

    use crate::error::SyncError;

    /// Object store that refuses writes after a fixed number of successes.
    struct BrokenAfter {
        inner: MemoryObjectStore,
        remaining: AtomicUsize,
    }

    impl BrokenAfter {
        fn new(writes: usize) -> Self {
            Self {
                inner: MemoryObjectStore::new("broken"),
                remaining: AtomicUsize::new(writes),
            }
        }

        fn take(&self) -> objsync_store::Result<()> {
            self.remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .map(|_| ())
                .map_err(|_| StoreError::Backend("disk full".into()))
        }
    }

    #[async_trait]
    impl ObjectStore for BrokenAfter {
        fn name(&self) -> &str {
            self.inner.name()
        }

        async fn set(&self, object: &Object) -> objsync_store::Result<()> {
            self.take()?;
            self.inner.set(object).await
        }

        async fn get(&self, id: &ObjectId) -> objsync_store::Result<Object> {
            self.inner.get(id).await
        }

        async fn get_all(&self) -> objsync_store::Result<Vec<Object>> {
            self.inner.get_all().await
        }

        async fn delete(&self, id: &ObjectId) -> objsync_store::Result<()> {
            self.take()?;
            self.inner.delete(id).await
        }
    }

    fn sealed(id: &str, modified_at: i64, value: &[u8]) -> Object {
        Object::new(id, modified_at, value.to_vec()).sealed(&Blake3Hasher)
    }

    #[tokio::test]
    async fn test_write_object_writes_target_and_record() {
        let local = MemoryObjectStore::new("local");
        let remote = MemoryObjectStore::new("remote");
        let records = MemoryRecordStore::new();
        let object = sealed("a", 1000, b"hello");

        let intents = vec![ChangeIntent::write_object(Replica::Remote, object.clone())];
        let applied = apply(&intents, &local, &remote, &records).await.unwrap();

        assert_eq!(applied, 1);
        assert!(local.is_empty().unwrap());
        let written = remote.get(&object.id).await.unwrap();
        assert_eq!(written, object);
        assert_ne!(written.value.as_ptr(), object.value.as_ptr());
        assert_eq!(
            records.get(&object.id).await.unwrap(),
            ConvergenceRecord::converged(object.id.clone(), object.hash)
        );
    }

    #[tokio::test]
    async fn test_delete_object_drops_record() {
        let local = MemoryObjectStore::new("local");
        let remote = MemoryObjectStore::new("remote");
        let records = MemoryRecordStore::new();
        let object = sealed("a", 1000, b"hello");
        local.set(&object).await.unwrap();
        records
            .set(&ConvergenceRecord::converged(object.id.clone(), object.hash))
            .await
            .unwrap();

        let intents = vec![ChangeIntent::DeleteObject {
            target: Replica::Local,
            id: object.id.clone(),
        }];
        apply(&intents, &local, &remote, &records).await.unwrap();

        assert!(local.is_empty().unwrap());
        assert!(records.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_record_intents_touch_only_records() {
        let local = MemoryObjectStore::new("local");
        let remote = MemoryObjectStore::new("remote");
        let records = MemoryRecordStore::new();
        let record = ConvergenceRecord::converged(ObjectId::from("a"), ContentHash::from_bytes([1; 32]));

        let intents = vec![
            ChangeIntent::WriteRecord {
                record: record.clone(),
            },
            ChangeIntent::DeleteRecord {
                id: ObjectId::from("gone"),
            },
        ];
        apply(&intents, &local, &remote, &records).await.unwrap();

        assert_eq!(records.get_all().await.unwrap(), vec![record]);
        assert!(local.is_empty().unwrap());
        assert!(remote.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_first_error_stops_batch_without_rollback() {
        let local = MemoryObjectStore::new("local");
        let remote = BrokenAfter::new(1);
        let records = MemoryRecordStore::new();

        let intents = vec![
            ChangeIntent::write_object(Replica::Remote, sealed("a", 1, b"a")),
            ChangeIntent::write_object(Replica::Remote, sealed("b", 2, b"b")),
            ChangeIntent::write_object(Replica::Remote, sealed("c", 3, b"c")),
        ];
        let err = apply(&intents, &local, &remote, &records).await.unwrap_err();

        assert!(matches!(err, SyncError::Store(StoreError::Backend(_))));
        assert_eq!(err.to_string(), "backend error: disk full");

        // "a" landed with its record; "b" failed before its record; "c" never ran.
        assert_eq!(remote.get_all().await.unwrap().len(), 1);
        assert_eq!(records.len().unwrap(), 1);
        assert!(records.get(&ObjectId::from("b")).await.unwrap_err().is_not_found());
    }
}
