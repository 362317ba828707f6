//! SQLite implementations of the store traits.
//!
//! Uses rusqlite with bundled SQLite, wrapped in async via
//! `tokio::task::spawn_blocking`. Several replicas and the record store can
//! share one [`Database`]; objects are partitioned by store name.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use objsync_core::{
    canonical_object_bytes, decode_object_bytes, Blake3Hasher, ContentHash, ContentHasher,
    ConvergenceRecord, Object, ObjectId,
};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{ObjectStore, RecordStore};

/// A shared, migrated SQLite connection.
///
/// Cheap to clone. Thread-safe via internal Mutex.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|e| {
                StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                    Some(format!("mutex poisoned: {}", e)),
                ))
            })?;
            f(&conn)
        })
        .await
        .map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!("spawn_blocking failed: {}", e)),
            ))
        })?
    }
}

/// Raw `objects` row: (id, hash, modified_at, body).
type ObjectRow = (String, Vec<u8>, i64, Vec<u8>);

fn select_object_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ObjectRow> {
    Ok((
        row.get("id")?,
        row.get("hash")?,
        row.get("modified_at")?,
        row.get("body")?,
    ))
}

/// Rebuild an object from its row, cross-checking the decoded body against
/// the indexed columns.
fn object_from_row((id, hash, modified_at, body): ObjectRow) -> Result<Object> {
    let hash = ContentHash::try_from(hash.as_slice())
        .map_err(|e| StoreError::InvalidData(format!("object {}: {}", id, e)))?;
    let (decoded_id, decoded_modified_at, value) = decode_object_bytes(&body)?;

    if decoded_id.as_str() != id || decoded_modified_at != modified_at {
        tracing::warn!(%id, "object body does not match its row");
        return Err(StoreError::InvalidData(format!(
            "object {}: body encodes {} at {}",
            id, decoded_id, decoded_modified_at
        )));
    }

    Ok(Object {
        id: decoded_id,
        hash,
        modified_at,
        value,
    })
}

/// SQLite-backed replica.
pub struct SqliteObjectStore {
    db: Database,
    name: String,
    hasher: Arc<dyn ContentHasher>,
}

impl SqliteObjectStore {
    /// Create a replica named `name` inside `db`, hashing with [`Blake3Hasher`].
    pub fn new(db: Database, name: impl Into<String>) -> Self {
        Self::with_hasher(db, name, Arc::new(Blake3Hasher))
    }

    /// Create a replica with a custom hasher.
    pub fn with_hasher(
        db: Database,
        name: impl Into<String>,
        hasher: Arc<dyn ContentHasher>,
    ) -> Self {
        Self {
            db,
            name: name.into(),
            hasher,
        }
    }

    /// Open a database file holding a single replica.
    pub fn open(path: impl AsRef<Path>, name: impl Into<String>) -> Result<Self> {
        Ok(Self::new(Database::open(path)?, name))
    }
}

#[async_trait]
impl ObjectStore for SqliteObjectStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn set(&self, object: &Object) -> Result<()> {
        let hash = object.compute_hash(self.hasher.as_ref());
        let body = canonical_object_bytes(&object.id, object.modified_at, &object.value);
        let replica = self.name.clone();
        let id = object.id.clone();
        let modified_at = object.modified_at;

        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO objects (replica, id, hash, modified_at, body, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(replica, id) DO UPDATE SET
                        hash = excluded.hash,
                        modified_at = excluded.modified_at,
                        body = excluded.body,
                        updated_at = excluded.updated_at",
                    params![
                        replica,
                        id.as_str(),
                        hash.as_bytes().as_slice(),
                        modified_at,
                        body,
                        now_millis(),
                    ],
                )?;
                Ok(())
            })
            .await
    }

    async fn get(&self, id: &ObjectId) -> Result<Object> {
        let replica = self.name.clone();
        let id = id.clone();

        self.db
            .call(move |conn| {
                let row = conn
                    .query_row(
                        "SELECT id, hash, modified_at, body
                         FROM objects WHERE replica = ?1 AND id = ?2",
                        params![replica, id.as_str()],
                        select_object_row,
                    )
                    .optional()?;

                match row {
                    Some(row) => object_from_row(row),
                    None => Err(StoreError::NotFound(id)),
                }
            })
            .await
    }

    async fn get_all(&self) -> Result<Vec<Object>> {
        let replica = self.name.clone();

        self.db
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, hash, modified_at, body
                     FROM objects WHERE replica = ?1 ORDER BY id",
                )?;
                let rows = stmt
                    .query_map(params![replica], select_object_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                rows.into_iter().map(object_from_row).collect()
            })
            .await
    }

    async fn delete(&self, id: &ObjectId) -> Result<()> {
        let replica = self.name.clone();
        let id = id.clone();

        self.db
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM objects WHERE replica = ?1 AND id = ?2",
                    params![replica, id.as_str()],
                )?;
                Ok(())
            })
            .await
    }
}

fn select_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, Vec<u8>, Vec<u8>)> {
    Ok((row.get("id")?, row.get("local_hash")?, row.get("remote_hash")?))
}

fn record_from_row((id, local, remote): (String, Vec<u8>, Vec<u8>)) -> Result<ConvergenceRecord> {
    let parse = |bytes: &[u8]| {
        ContentHash::try_from(bytes)
            .map_err(|e| StoreError::InvalidData(format!("record {}: {}", id, e)))
    };
    let local_hash = parse(&local)?;
    let remote_hash = parse(&remote)?;

    Ok(ConvergenceRecord {
        id: ObjectId::new(id),
        local_hash,
        remote_hash,
    })
}

/// SQLite-backed convergence record store.
#[derive(Clone)]
pub struct SqliteRecordStore {
    db: Database,
}

impl SqliteRecordStore {
    /// Create a record store inside `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open a database file holding only records.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn set(&self, record: &ConvergenceRecord) -> Result<()> {
        let record = record.clone();

        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO convergence_records (id, local_hash, remote_hash, updated_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(id) DO UPDATE SET
                        local_hash = excluded.local_hash,
                        remote_hash = excluded.remote_hash,
                        updated_at = excluded.updated_at",
                    params![
                        record.id.as_str(),
                        record.local_hash.as_bytes().as_slice(),
                        record.remote_hash.as_bytes().as_slice(),
                        now_millis(),
                    ],
                )?;
                Ok(())
            })
            .await
    }

    async fn get(&self, id: &ObjectId) -> Result<ConvergenceRecord> {
        let id = id.clone();

        self.db
            .call(move |conn| {
                let row = conn
                    .query_row(
                        "SELECT id, local_hash, remote_hash
                         FROM convergence_records WHERE id = ?1",
                        params![id.as_str()],
                        select_record,
                    )
                    .optional()?;

                match row {
                    Some(row) => record_from_row(row),
                    None => Err(StoreError::NotFound(id)),
                }
            })
            .await
    }

    async fn get_all(&self) -> Result<Vec<ConvergenceRecord>> {
        self.db
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, local_hash, remote_hash
                     FROM convergence_records ORDER BY id",
                )?;
                let rows = stmt
                    .query_map([], select_record)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                rows.into_iter().map(record_from_row).collect()
            })
            .await
    }

    async fn delete(&self, id: &ObjectId) -> Result<()> {
        let id = id.clone();

        self.db
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM convergence_records WHERE id = ?1",
                    params![id.as_str()],
                )?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::StoreExt;

    fn object(id: &str, modified_at: i64, value: &[u8]) -> Object {
        Object::new(id, modified_at, value.to_vec())
    }

    #[tokio::test]
    async fn test_set_and_get_object() {
        let store = SqliteObjectStore::new(Database::open_memory().unwrap(), "local");
        let original = object("a", 1000, b"hello");

        store.set(&original).await.unwrap();

        let stored = store.get(&original.id).await.unwrap();
        assert_eq!(stored.id, original.id);
        assert_eq!(stored.modified_at, 1000);
        assert_eq!(&stored.value[..], b"hello");
        assert_eq!(stored.hash, original.compute_hash(&Blake3Hasher));
    }

    #[tokio::test]
    async fn test_get_missing_object_is_not_found() {
        let store = SqliteObjectStore::new(Database::open_memory().unwrap(), "local");
        let err = store.get(&ObjectId::from("nope")).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(store.try_get(&ObjectId::from("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replicas_share_database_without_mixing() {
        let db = Database::open_memory().unwrap();
        let local = SqliteObjectStore::new(db.clone(), "local");
        let remote = SqliteObjectStore::new(db, "remote");

        local.set(&object("a", 1, b"local")).await.unwrap();
        remote.set(&object("a", 2, b"remote")).await.unwrap();
        remote.set(&object("b", 3, b"only remote")).await.unwrap();

        assert_eq!(local.get_all().await.unwrap().len(), 1);
        assert_eq!(remote.get_all().await.unwrap().len(), 2);
        assert_eq!(&local.get(&ObjectId::from("a")).await.unwrap().value[..], b"local");

        local.delete(&ObjectId::from("a")).await.unwrap();
        assert!(remote.get(&ObjectId::from("a")).await.is_ok());
    }

    #[tokio::test]
    async fn test_upsert_replaces_object() {
        let store = SqliteObjectStore::new(Database::open_memory().unwrap(), "local");
        store.set(&object("a", 1, b"one")).await.unwrap();
        store.set(&object("a", 2, b"two")).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].modified_at, 2);
        assert_eq!(&all[0].value[..], b"two");
    }

    #[tokio::test]
    async fn test_corrupt_body_is_invalid_data() {
        let db = Database::open_memory().unwrap();
        let store = SqliteObjectStore::new(db.clone(), "local");
        store.set(&object("a", 1, b"one")).await.unwrap();

        let other = canonical_object_bytes(&ObjectId::from("b"), 1, b"one");
        db.call(move |conn| {
            conn.execute("UPDATE objects SET body = ?1 WHERE id = 'a'", params![other])?;
            Ok(())
        })
        .await
        .unwrap();

        let err = store.get(&ObjectId::from("a")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_record_store_roundtrip() {
        let records = SqliteRecordStore::new(Database::open_memory().unwrap());
        let id = ObjectId::from("a");
        let record = ConvergenceRecord {
            id: id.clone(),
            local_hash: ContentHash::from_bytes([1; 32]),
            remote_hash: ContentHash::from_bytes([2; 32]),
        };

        assert!(records.get(&id).await.unwrap_err().is_not_found());

        records.set(&record).await.unwrap();
        assert_eq!(records.get(&id).await.unwrap(), record);

        let settled = ConvergenceRecord::converged(id.clone(), ContentHash::from_bytes([3; 32]));
        records.set(&settled).await.unwrap();
        assert_eq!(records.get_all().await.unwrap(), vec![settled]);

        records.delete(&id).await.unwrap();
        records.delete(&id).await.unwrap();
        assert!(records.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replica.db");

        {
            let store = SqliteObjectStore::open(&path, "local").unwrap();
            store.set(&object("a", 1000, b"persisted")).await.unwrap();
        }

        let store = SqliteObjectStore::open(&path, "local").unwrap();
        let stored = store.get(&ObjectId::from("a")).await.unwrap();
        assert_eq!(&stored.value[..], b"persisted");
    }
}
