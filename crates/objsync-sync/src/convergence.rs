//! Convergence verification.
//!
//! After a sync, both replicas should hold the same identifiers with the
//! same hashes, and every record should state that shared hash on both
//! sides. These checks are read-only.

use std::collections::{BTreeMap, BTreeSet};

use objsync_core::{ContentHash, ConvergenceRecord, Object, ObjectId};
use objsync_store::{ObjectStore, RecordStore};

use crate::error::Result;

/// Domain tag for replica digests.
const REPLICA_DOMAIN: &[u8] = b"objsync-replica-v0:";

/// Result of convergence verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvergenceResult {
    /// Both replicas and the records agree.
    Converged,
    /// Replicas agree but the records do not reflect it yet.
    NotConverged { reason: String },
    /// The replicas hold different content under these identifiers.
    Diverged { ids: Vec<ObjectId> },
}

impl ConvergenceResult {
    /// Check if the replicas have converged.
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceResult::Converged)
    }

    /// Check if the replicas hold different content.
    pub fn is_diverged(&self) -> bool {
        matches!(self, ConvergenceResult::Diverged { .. })
    }
}

/// Compute a deterministic digest over a set of objects.
///
/// Algorithm:
/// 1. Sort by identifier
/// 2. Hash: Blake3(domain || for each: len(id) || id || hash)
///
/// Two replicas with equal digests hold the same identifiers under the same
/// content hashes.
pub fn digest_objects(objects: &[Object]) -> ContentHash {
    let sorted: BTreeMap<&ObjectId, &ContentHash> =
        objects.iter().map(|o| (&o.id, &o.hash)).collect();

    let mut hasher = blake3::Hasher::new();
    hasher.update(REPLICA_DOMAIN);

    for (id, hash) in sorted {
        hasher.update(&(id.as_str().len() as u64).to_le_bytes());
        hasher.update(id.as_str().as_bytes());
        hasher.update(hash.as_bytes());
    }

    ContentHash::from_bytes(*hasher.finalize().as_bytes())
}

/// Compute the digest of everything a replica currently holds.
pub async fn compute_replica_digest<S: ObjectStore + ?Sized>(store: &S) -> Result<ContentHash> {
    let objects = store.get_all().await?;
    Ok(digest_objects(&objects))
}

/// Verify that two replicas and their records have converged.
pub async fn verify_convergence<L, R, S>(local: &L, remote: &R, records: &S) -> Result<ConvergenceResult>
where
    L: ObjectStore + ?Sized,
    R: ObjectStore + ?Sized,
    S: RecordStore + ?Sized,
{
    let local_objects = local.get_all().await?;
    let remote_objects = remote.get_all().await?;
    let all_records = records.get_all().await?;

    Ok(check(&local_objects, &remote_objects, &all_records))
}

fn check(local: &[Object], remote: &[Object], records: &[ConvergenceRecord]) -> ConvergenceResult {
    let local: BTreeMap<&ObjectId, ContentHash> = local.iter().map(|o| (&o.id, o.hash)).collect();
    let remote: BTreeMap<&ObjectId, ContentHash> = remote.iter().map(|o| (&o.id, o.hash)).collect();

    let ids: BTreeSet<&ObjectId> = local.keys().chain(remote.keys()).copied().collect();
    let diverged: Vec<ObjectId> = ids
        .iter()
        .filter(|id| local.get(*id) != remote.get(*id))
        .map(|id| (*id).clone())
        .collect();

    if !diverged.is_empty() {
        return ConvergenceResult::Diverged { ids: diverged };
    }

    let records: BTreeMap<&ObjectId, &ConvergenceRecord> = records.iter().map(|r| (&r.id, r)).collect();

    for (id, hash) in &local {
        match records.get(id) {
            None => {
                return ConvergenceResult::NotConverged {
                    reason: format!("no record for {}", id),
                };
            }
            Some(record) if record.local_hash != *hash || record.remote_hash != *hash => {
                return ConvergenceResult::NotConverged {
                    reason: format!(
                        "record for {} is ({}, {}), replicas hold {}",
                        id, record.local_hash, record.remote_hash, hash
                    ),
                };
            }
            Some(_) => {}
        }
    }

    if let Some(orphan) = records.keys().find(|id| !local.contains_key(*id)) {
        return ConvergenceResult::NotConverged {
            reason: format!("orphaned record for {}", orphan),
        };
    }

    ConvergenceResult::Converged
}
