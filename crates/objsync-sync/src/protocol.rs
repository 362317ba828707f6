//! The sync entry points: snapshot, discover, apply.
//!
//! A run reads all three stores, classifies every identifier with
//! [`discover`], then hands the intents to [`apply`]. The engine holds no
//! state between runs; everything it knows comes from the stores.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use objsync_core::{discover, ChangeIntent, Discovery, IntentKind, ObjectId, Replica, TieBreak};
use objsync_store::{ObjectStore, RecordStore, RecordStoreExt, StoreExt};

use crate::error::Result;
use crate::reconcile::apply;

/// Configuration for sync behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// How conflicts with equal modification times are settled.
    pub tie_break: TieBreak,
    /// Discover and report, but apply nothing.
    pub dry_run: bool,
}

impl SyncConfig {
    /// Set the tie-break rule.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Enable or disable dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Result of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Identifiers present in at least one replica.
    pub observed: usize,
    /// Intents produced by discovery.
    pub planned: usize,
    /// Intents applied. Zero on a dry run.
    pub applied: usize,
    /// Objects copied into the local replica.
    pub written_local: usize,
    /// Objects copied into the remote replica.
    pub written_remote: usize,
    /// Objects deleted from the local replica.
    pub deleted_local: usize,
    /// Objects deleted from the remote replica.
    pub deleted_remote: usize,
    /// Records re-established without moving an object.
    pub records_written: usize,
    /// Orphaned records dropped.
    pub records_deleted: usize,
    /// Conflicts settled by the resolver.
    pub conflicts: usize,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl SyncReport {
    /// Tally a discovery result.
    pub fn from_discovery(discovery: &Discovery) -> Self {
        let mut report = SyncReport {
            observed: discovery.observed.len(),
            planned: discovery.intents.len(),
            conflicts: discovery.conflicts.len(),
            ..Default::default()
        };

        for intent in &discovery.intents {
            match (intent.kind(), intent.target()) {
                (IntentKind::WriteObject, Some(Replica::Local)) => report.written_local += 1,
                (IntentKind::WriteObject, _) => report.written_remote += 1,
                (IntentKind::DeleteObject, Some(Replica::Local)) => report.deleted_local += 1,
                (IntentKind::DeleteObject, _) => report.deleted_remote += 1,
                (IntentKind::WriteRecord, _) => report.records_written += 1,
                (IntentKind::DeleteRecord, _) => report.records_deleted += 1,
            }
        }

        report
    }

    /// Whether the replicas were already converged.
    pub fn is_noop(&self) -> bool {
        self.planned == 0
    }
}

/// Snapshot all three stores and run discovery. Nothing is mutated.
pub async fn plan<L, R, S>(local: &L, remote: &R, records: &S, config: &SyncConfig) -> Result<Discovery>
where
    L: ObjectStore + ?Sized,
    R: ObjectStore + ?Sized,
    S: RecordStore + ?Sized,
{
    let local_objects = local.get_all().await?;
    let remote_objects = remote.get_all().await?;
    let all_records = records.get_all().await?;

    let discovery = discover(&local_objects, &remote_objects, &all_records, config.tie_break);
    log_discovery(&discovery, local.name(), remote.name());
    Ok(discovery)
}

/// Bring both replicas to the same state.
///
/// Returns the first store failure, if any; intents applied before it stay
/// applied and a later run finishes the job.
pub async fn sync<L, R, S>(local: &L, remote: &R, records: &S, config: &SyncConfig) -> Result<SyncReport>
where
    L: ObjectStore + ?Sized,
    R: ObjectStore + ?Sized,
    S: RecordStore + ?Sized,
{
    let discovery = plan(local, remote, records, config).await?;
    finish(discovery, local, remote, records, config).await
}

/// Reconcile only the given identifiers.
///
/// Each identifier is read with a point lookup; absence is taken from
/// `NotFound`. Only records of these identifiers are considered, so orphans
/// elsewhere are left for a full [`sync`].
pub async fn sync_ids<L, R, S>(
    local: &L,
    remote: &R,
    records: &S,
    ids: &[ObjectId],
    config: &SyncConfig,
) -> Result<SyncReport>
where
    L: ObjectStore + ?Sized,
    R: ObjectStore + ?Sized,
    S: RecordStore + ?Sized,
{
    let ids: BTreeSet<&ObjectId> = ids.iter().collect();

    let mut local_objects = Vec::new();
    let mut remote_objects = Vec::new();
    let mut selected_records = Vec::new();

    for id in ids {
        local_objects.extend(local.try_get(id).await?);
        remote_objects.extend(remote.try_get(id).await?);
        selected_records.extend(records.try_get(id).await?);
    }

    let discovery = discover(
        &local_objects,
        &remote_objects,
        &selected_records,
        config.tie_break,
    );
    log_discovery(&discovery, local.name(), remote.name());
    finish(discovery, local, remote, records, config).await
}

async fn finish<L, R, S>(
    discovery: Discovery,
    local: &L,
    remote: &R,
    records: &S,
    config: &SyncConfig,
) -> Result<SyncReport>
where
    L: ObjectStore + ?Sized,
    R: ObjectStore + ?Sized,
    S: RecordStore + ?Sized,
{
    let mut report = SyncReport::from_discovery(&discovery);
    report.dry_run = config.dry_run;

    if !config.dry_run {
        report.applied = apply(&discovery.intents, local, remote, records).await?;
    }

    tracing::info!(
        local = local.name(),
        remote = remote.name(),
        observed = report.observed,
        planned = report.planned,
        applied = report.applied,
        conflicts = report.conflicts,
        dry_run = report.dry_run,
        "sync finished"
    );

    Ok(report)
}

fn log_discovery(discovery: &Discovery, local: &str, remote: &str) {
    for conflict in &discovery.conflicts {
        tracing::warn!(
            id = %conflict.id,
            winner = %conflict.winner,
            tied = conflict.tied,
            local,
            remote,
            "conflicting edits, keeping {} copy",
            conflict.winner
        );
    }

    for intent in &discovery.intents {
        if let ChangeIntent::DeleteRecord { id } = intent {
            tracing::warn!(%id, "dropping orphaned convergence record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use objsync_core::{Blake3Hasher, ContentHash, ConvergenceRecord, Object};
    use objsync_store::{MemoryObjectStore, MemoryRecordStore};

    struct Replicas {
        local: MemoryObjectStore,
        remote: MemoryObjectStore,
        records: MemoryRecordStore,
    }

    impl Replicas {
        fn new() -> Self {
            Self {
                local: MemoryObjectStore::new("local"),
                remote: MemoryObjectStore::new("remote"),
                records: MemoryRecordStore::new(),
            }
        }

        async fn sync(&self) -> SyncReport {
            sync(&self.local, &self.remote, &self.records, &SyncConfig::default())
                .await
                .unwrap()
        }

        async fn snapshot(&self) -> (Vec<Object>, Vec<Object>, Vec<ConvergenceRecord>) {
            (
                self.local.get_all().await.unwrap(),
                self.remote.get_all().await.unwrap(),
                self.records.get_all().await.unwrap(),
            )
        }
    }

    fn object(id: &str, modified_at: i64, value: &str) -> Object {
        Object::new(id, modified_at, value.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_empty_replicas_are_noop() {
        let replicas = Replicas::new();
        let report = replicas.sync().await;
        assert!(report.is_noop());
        assert_eq!(report, SyncReport::default());
    }

    #[tokio::test]
    async fn test_local_adds_reach_remote() {
        let replicas = Replicas::new();
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            replicas.local.set(&object(id, i as i64, id)).await.unwrap();
        }

        let report = replicas.sync().await;
        assert_eq!(report.written_remote, 3);
        assert_eq!(report.applied, 3);

        let (local, remote, records) = replicas.snapshot().await;
        assert_eq!(local, remote);
        assert_eq!(records.len(), 3);
        for (object, record) in local.iter().zip(&records) {
            assert_eq!(*record, ConvergenceRecord::converged(object.id.clone(), object.hash));
        }

        assert!(replicas.sync().await.is_noop());
    }

    #[tokio::test]
    async fn test_divergent_edit_later_wins() {
        let replicas = Replicas::new();
        replicas.local.set(&object("x", 100, "base")).await.unwrap();
        replicas.sync().await;

        replicas.local.set(&object("x", 200, "local edit")).await.unwrap();
        replicas.remote.set(&object("x", 300, "remote edit")).await.unwrap();

        let report = replicas.sync().await;
        assert_eq!(report.conflicts, 1);
        assert_eq!(report.written_local, 1);

        let (local, remote, records) = replicas.snapshot().await;
        assert_eq!(local, remote);
        assert_eq!(&local[0].value[..], b"remote edit");
        assert_eq!(records[0], ConvergenceRecord::converged(local[0].id.clone(), local[0].hash));
    }

    #[tokio::test]
    async fn test_dual_delete_drops_orphaned_record() {
        let replicas = Replicas::new();
        replicas.local.set(&object("x", 100, "v")).await.unwrap();
        replicas.sync().await;

        replicas.local.delete(&ObjectId::from("x")).await.unwrap();
        replicas.remote.delete(&ObjectId::from("x")).await.unwrap();

        let report = replicas.sync().await;
        assert_eq!(report.records_deleted, 1);
        assert_eq!(report.observed, 0);
        assert!(replicas.records.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_dry_run_reports_without_applying() {
        let replicas = Replicas::new();
        replicas.remote.set(&object("a", 1, "v")).await.unwrap();

        let config = SyncConfig::default().with_dry_run(true);
        let report = sync(&replicas.local, &replicas.remote, &replicas.records, &config)
            .await
            .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.planned, 1);
        assert_eq!(report.written_local, 1);
        assert_eq!(report.applied, 0);
        assert!(replicas.local.is_empty().unwrap());
        assert!(replicas.records.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_plan_does_not_mutate() {
        let replicas = Replicas::new();
        replicas.local.set(&object("a", 1, "v")).await.unwrap();

        let discovery = plan(
            &replicas.local,
            &replicas.remote,
            &replicas.records,
            &SyncConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(discovery.len(), 1);
        assert!(replicas.remote.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_sync_ids_touches_only_named_ids() {
        let replicas = Replicas::new();
        replicas.local.set(&object("a", 1, "a")).await.unwrap();
        replicas.local.set(&object("b", 2, "b")).await.unwrap();
        let stale = ConvergenceRecord::converged(ObjectId::from("z"), ContentHash::from_bytes([9; 32]));
        replicas.records.set(&stale).await.unwrap();

        let ids = vec![ObjectId::from("a"), ObjectId::from("a"), ObjectId::from("missing")];
        let report = sync_ids(
            &replicas.local,
            &replicas.remote,
            &replicas.records,
            &ids,
            &SyncConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.written_remote, 1);
        assert_eq!(report.observed, 1);
        assert!(replicas.remote.get(&ObjectId::from("a")).await.is_ok());
        assert!(replicas.remote.get(&ObjectId::from("b")).await.unwrap_err().is_not_found());
        // The orphan outside the selection survives until a full sync.
        assert!(replicas.records.get(&ObjectId::from("z")).await.is_ok());

        let report = replicas.sync().await;
        assert_eq!(report.written_remote, 1);
        assert_eq!(report.records_deleted, 1);
    }

    #[tokio::test]
    async fn test_sync_ids_drops_selected_orphan() {
        let replicas = Replicas::new();
        let orphan = ConvergenceRecord::converged(ObjectId::from("z"), ContentHash::from_bytes([9; 32]));
        replicas.records.set(&orphan).await.unwrap();

        let report = sync_ids(
            &replicas.local,
            &replicas.remote,
            &replicas.records,
            &[ObjectId::from("z")],
            &SyncConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.records_deleted, 1);
        assert!(replicas.records.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_tie_break_config_is_honored() {
        let replicas = Replicas::new();
        replicas.local.set(&object("x", 500, "local")).await.unwrap();
        replicas.remote.set(&object("x", 500, "remote")).await.unwrap();

        let config = SyncConfig::default().with_tie_break(TieBreak::PreferLocal);
        let report = sync(&replicas.local, &replicas.remote, &replicas.records, &config)
            .await
            .unwrap();
        assert_eq!(report.conflicts, 1);

        let remote = replicas.remote.get(&ObjectId::from("x")).await.unwrap();
        assert_eq!(&remote.value[..], b"local");
        assert_eq!(remote.hash, object("x", 500, "local").compute_hash(&Blake3Hasher));
    }

    #[test]
    fn test_config_from_json() {
        let config: SyncConfig = serde_json::from_str(r#"{"tie_break": "prefer_remote"}"#).unwrap();
        assert_eq!(config.tie_break, TieBreak::PreferRemote);
        assert!(!config.dry_run);

        let config: SyncConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SyncConfig::default());
    }
}
