//! Discovery: the three-way diff between two replicas and their records.
//!
//! Every identifier present in either replica is classified by which of
//! (local, remote, record) hold it:
//!
//! | L | R | Rec | Action                                              |
//! |---|---|-----|-----------------------------------------------------|
//! | ✓ | ✗ | ✗ | new locally: write local -> remote                   |
//! | ✓ | ✗ | ✓ | deleted remotely: delete from local                 |
//! | ✗ | ✓ | ✗ | new remotely: write remote -> local                 |
//! | ✗ | ✓ | ✓ | deleted locally: delete from remote                 |
//! | ✓ | ✓ | ✗ | first contact: record if equal, otherwise resolve   |
//! | ✓ | ✓ | ✓ | compare both hashes against the record              |
//!
//! Records whose identifier appears in neither replica are orphans and get
//! dropped. Nothing here mutates its inputs.

use std::collections::{BTreeMap, BTreeSet};

use crate::intent::ChangeIntent;
use crate::object::{ConvergenceRecord, Object};
use crate::resolve::{resolve_conflict, ConflictOutcome, TieBreak};
use crate::types::{ObjectId, Replica};

/// The output of one discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Pending mutations, in ascending identifier order, orphan records last.
    pub intents: Vec<ChangeIntent>,
    /// Every identifier seen in either replica.
    pub observed: BTreeSet<ObjectId>,
    /// Conflicts settled by the resolver during this pass.
    pub conflicts: Vec<ConflictOutcome>,
}

impl Discovery {
    /// Whether the replicas are already converged.
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Number of pending intents.
    pub fn len(&self) -> usize {
        self.intents.len()
    }
}

/// Classify every identifier and emit the intents that converge both replicas.
///
/// Identifiers are processed in ascending order, so the same snapshots
/// always yield the same intent list.
pub fn discover(
    local: &[Object],
    remote: &[Object],
    records: &[ConvergenceRecord],
    tie_break: TieBreak,
) -> Discovery {
    let local_by_id: BTreeMap<&ObjectId, &Object> = local.iter().map(|o| (&o.id, o)).collect();
    let remote_by_id: BTreeMap<&ObjectId, &Object> = remote.iter().map(|o| (&o.id, o)).collect();
    let records_by_id: BTreeMap<&ObjectId, &ConvergenceRecord> =
        records.iter().map(|r| (&r.id, r)).collect();

    let ids: BTreeSet<&ObjectId> = local_by_id.keys().chain(remote_by_id.keys()).copied().collect();

    let mut discovery = Discovery::default();

    for id in ids {
        discovery.observed.insert(id.clone());

        let local = local_by_id.get(id).copied();
        let remote = remote_by_id.get(id).copied();
        let record = records_by_id.get(id).copied();

        match (local, remote, record) {
            (Some(local), None, None) => {
                discovery
                    .intents
                    .push(ChangeIntent::write_object(Replica::Remote, local.clone()));
            }
            (Some(_), None, Some(_)) => {
                discovery.intents.push(ChangeIntent::DeleteObject {
                    target: Replica::Local,
                    id: id.clone(),
                });
            }
            (None, Some(remote), None) => {
                discovery
                    .intents
                    .push(ChangeIntent::write_object(Replica::Local, remote.clone()));
            }
            (None, Some(_), Some(_)) => {
                discovery.intents.push(ChangeIntent::DeleteObject {
                    target: Replica::Remote,
                    id: id.clone(),
                });
            }
            (Some(local), Some(remote), record) => {
                classify_shared(local, remote, record, tie_break, &mut discovery);
            }
            (None, None, _) => {}
        }
    }

    for (id, _) in records_by_id {
        if !discovery.observed.contains(id) {
            discovery
                .intents
                .push(ChangeIntent::DeleteRecord { id: id.clone() });
        }
    }

    discovery
}

/// Both replicas hold the identifier.
fn classify_shared(
    local: &Object,
    remote: &Object,
    record: Option<&ConvergenceRecord>,
    tie_break: TieBreak,
    discovery: &mut Discovery,
) {
    if local.hash == remote.hash {
        let baseline_matches = record
            .map(|r| r.local_hash == local.hash && r.remote_hash == remote.hash)
            .unwrap_or(false);

        if !baseline_matches {
            discovery.intents.push(ChangeIntent::WriteRecord {
                record: ConvergenceRecord::converged(local.id.clone(), local.hash),
            });
        }
        return;
    }

    let Some(record) = record else {
        push_conflict(local, remote, tie_break, discovery);
        return;
    };

    let local_changed = local.hash != record.local_hash;
    let remote_changed = remote.hash != record.remote_hash;

    match (local_changed, remote_changed) {
        (true, false) => {
            discovery
                .intents
                .push(ChangeIntent::write_object(Replica::Remote, local.clone()));
        }
        (false, true) => {
            discovery
                .intents
                .push(ChangeIntent::write_object(Replica::Local, remote.clone()));
        }
        // Neither side moved but they still differ: the record itself was
        // never settled, so it can't be trusted as a baseline.
        (false, false) | (true, true) => {
            push_conflict(local, remote, tie_break, discovery);
        }
    }
}

fn push_conflict(local: &Object, remote: &Object, tie_break: TieBreak, discovery: &mut Discovery) {
    let intent = resolve_conflict(local, remote, tie_break);
    let winner = intent.target().map(Replica::other).unwrap_or(Replica::Local);

    discovery.conflicts.push(ConflictOutcome {
        id: local.id.clone(),
        winner,
        tied: local.modified_at == remote.modified_at,
    });
    discovery.intents.push(intent);
}
