//! Last-Write-Wins conflict resolution.
//!
//! Invoked by discovery when both replicas hold divergent copies of one
//! identifier and the convergence record can't say which side moved. The
//! copy with the strictly later `modified_at` wins; ties fall through to a
//! configured [`TieBreak`] so the outcome never depends on iteration order.

use serde::{Deserialize, Serialize};

use crate::intent::ChangeIntent;
use crate::object::Object;
use crate::types::{ObjectId, Replica};

/// Deterministic rule for equal modification timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The byte-wise smaller content hash wins.
    #[default]
    LowerHash,
    /// The local copy wins.
    PreferLocal,
    /// The remote copy wins.
    PreferRemote,
}

/// How one conflict was settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictOutcome {
    pub id: ObjectId,
    pub winner: Replica,
    /// Whether the timestamps tied and the tie-break decided.
    pub tied: bool,
}

/// Decide which replica's copy survives.
pub fn pick_winner(local: &Object, remote: &Object, tie_break: TieBreak) -> Replica {
    if local.modified_at > remote.modified_at {
        return Replica::Local;
    }
    if remote.modified_at > local.modified_at {
        return Replica::Remote;
    }

    match tie_break {
        TieBreak::LowerHash => {
            if remote.hash < local.hash {
                Replica::Remote
            } else {
                Replica::Local
            }
        }
        TieBreak::PreferLocal => Replica::Local,
        TieBreak::PreferRemote => Replica::Remote,
    }
}

/// Produce the intent that overwrites the losing replica with the winner.
///
/// The winner is copied verbatim, hash included, and the record is reset to
/// `{winner_hash, winner_hash}`. No I/O happens here.
pub fn resolve_conflict(local: &Object, remote: &Object, tie_break: TieBreak) -> ChangeIntent {
    match pick_winner(local, remote, tie_break) {
        Replica::Local => ChangeIntent::write_object(Replica::Remote, local.clone()),
        Replica::Remote => ChangeIntent::write_object(Replica::Local, remote.clone()),
    }
}
