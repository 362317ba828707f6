//! The Replicator: one local replica, one remote replica, one record store.
//!
//! Holds the three stores and a configuration, and makes sure only one sync
//! run touches them at a time.

use std::sync::Arc;

use objsync_core::{Discovery, ObjectId};
use objsync_store::{ObjectStore, RecordStore};
use objsync_sync::{ConvergenceResult, SyncConfig, SyncReport};
use tokio::sync::Mutex;

use crate::error::{ReplicatorError, Result};

/// Configuration for the Replicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicatorConfig {
    /// Settings for each sync run.
    pub sync: SyncConfig,
    /// Upper bound on runs in [`Replicator::sync_until_converged`].
    pub max_rounds: usize,
}

impl Default for ReplicatorConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            max_rounds: 3,
        }
    }
}

impl ReplicatorConfig {
    /// Set the per-run sync configuration.
    pub fn with_sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    /// Set the round limit for [`Replicator::sync_until_converged`].
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }
}

/// Reconciles a local and a remote replica.
///
/// Sync runs assume exclusive access to all three stores, so every
/// operation that applies intents takes an internal lock first. Reads that
/// apply nothing (`plan`, `verify`) take it too, so they never observe a
/// half-applied run.
pub struct Replicator<L, R, S> {
    local: Arc<L>,
    remote: Arc<R>,
    records: Arc<S>,
    config: ReplicatorConfig,
    run_lock: Mutex<()>,
}

impl<L, R, S> Replicator<L, R, S>
where
    L: ObjectStore,
    R: ObjectStore,
    S: RecordStore,
{
    /// Create a replicator that owns its stores.
    pub fn new(local: L, remote: R, records: S, config: ReplicatorConfig) -> Self {
        Self::from_shared(Arc::new(local), Arc::new(remote), Arc::new(records), config)
    }

    /// Create a replicator over stores shared with the rest of the program.
    pub fn from_shared(local: Arc<L>, remote: Arc<R>, records: Arc<S>, config: ReplicatorConfig) -> Self {
        Self {
            local,
            remote,
            records,
            config,
            run_lock: Mutex::new(()),
        }
    }

    /// The local replica.
    pub fn local(&self) -> &L {
        &self.local
    }

    /// The remote replica.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// The convergence records.
    pub fn records(&self) -> &S {
        &self.records
    }

    /// The configuration.
    pub fn config(&self) -> &ReplicatorConfig {
        &self.config
    }

    /// Run one sync.
    pub async fn sync(&self) -> Result<SyncReport> {
        let _guard = self.run_lock.lock().await;
        self.sync_locked().await
    }

    /// Run one sync restricted to `ids`.
    pub async fn sync_ids(&self, ids: &[ObjectId]) -> Result<SyncReport> {
        let _guard = self.run_lock.lock().await;
        let report = objsync_sync::sync_ids(
            self.local.as_ref(),
            self.remote.as_ref(),
            self.records.as_ref(),
            ids,
            &self.config.sync,
        )
        .await?;
        Ok(report)
    }

    /// Compute what a sync would do, without doing it.
    pub async fn plan(&self) -> Result<Discovery> {
        let _guard = self.run_lock.lock().await;
        let discovery = objsync_sync::plan(
            self.local.as_ref(),
            self.remote.as_ref(),
            self.records.as_ref(),
            &self.config.sync,
        )
        .await?;
        Ok(discovery)
    }

    /// Sync repeatedly until a run finds nothing to do.
    ///
    /// A single successful run already converges the replicas; further
    /// rounds only matter when the stores are written concurrently with
    /// the sync. Returns the report of every round. In dry-run mode a
    /// single round is run, since nothing it plans is ever applied.
    pub async fn sync_until_converged(&self) -> Result<Vec<SyncReport>> {
        let _guard = self.run_lock.lock().await;
        let mut reports = Vec::new();

        for round in 1..=self.config.max_rounds {
            let report = self.sync_locked().await?;
            let done = report.is_noop() || report.dry_run;
            reports.push(report);

            if done {
                tracing::debug!(rounds = round, "replicas converged");
                return Ok(reports);
            }
        }

        tracing::warn!(
            rounds = self.config.max_rounds,
            "replicas still changing after round limit"
        );
        Err(ReplicatorError::NotConverged {
            rounds: self.config.max_rounds,
        })
    }

    /// Check whether the replicas and records agree.
    pub async fn verify(&self) -> Result<ConvergenceResult> {
        let _guard = self.run_lock.lock().await;
        let result = objsync_sync::verify_convergence(
            self.local.as_ref(),
            self.remote.as_ref(),
            self.records.as_ref(),
        )
        .await?;
        Ok(result)
    }

    async fn sync_locked(&self) -> Result<SyncReport> {
        let report = objsync_sync::sync(
            self.local.as_ref(),
            self.remote.as_ref(),
            self.records.as_ref(),
            &self.config.sync,
        )
        .await?;
        Ok(report)
    }
}
