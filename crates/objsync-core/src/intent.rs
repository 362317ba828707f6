//! Change intents: the hand-off between discovery and the apply phase.
//!
//! An intent describes exactly one object-store or record-store mutation
//! for one identifier. Intents are plain values; they carry the object to
//! write rather than a reference into the store it came from.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::object::{ConvergenceRecord, Object};
use crate::types::{ObjectId, Replica};

/// A pending mutation produced by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeIntent {
    /// Write `object` into `target`, then persist `record`.
    WriteObject {
        target: Replica,
        object: Object,
        record: ConvergenceRecord,
    },
    /// Delete `id` from `target`, then delete its convergence record.
    DeleteObject { target: Replica, id: ObjectId },
    /// Persist a convergence record without touching either replica.
    WriteRecord { record: ConvergenceRecord },
    /// Drop a convergence record without touching either replica.
    DeleteRecord { id: ObjectId },
}

/// Discriminator for [`ChangeIntent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentKind {
    WriteObject,
    DeleteObject,
    WriteRecord,
    DeleteRecord,
}

impl ChangeIntent {
    /// A write of `object` into `target` that leaves both sides at its hash.
    pub fn write_object(target: Replica, object: Object) -> Self {
        let record = ConvergenceRecord::converged(object.id.clone(), object.hash);
        ChangeIntent::WriteObject {
            target,
            object,
            record,
        }
    }

    /// The kind of this intent.
    pub fn kind(&self) -> IntentKind {
        match self {
            ChangeIntent::WriteObject { .. } => IntentKind::WriteObject,
            ChangeIntent::DeleteObject { .. } => IntentKind::DeleteObject,
            ChangeIntent::WriteRecord { .. } => IntentKind::WriteRecord,
            ChangeIntent::DeleteRecord { .. } => IntentKind::DeleteRecord,
        }
    }

    /// The identifier this intent mutates.
    pub fn id(&self) -> &ObjectId {
        match self {
            ChangeIntent::WriteObject { object, .. } => &object.id,
            ChangeIntent::DeleteObject { id, .. } => id,
            ChangeIntent::WriteRecord { record } => &record.id,
            ChangeIntent::DeleteRecord { id } => id,
        }
    }

    /// The replica this intent mutates, if any.
    pub fn target(&self) -> Option<Replica> {
        match self {
            ChangeIntent::WriteObject { target, .. } | ChangeIntent::DeleteObject { target, .. } => {
                Some(*target)
            }
            ChangeIntent::WriteRecord { .. } | ChangeIntent::DeleteRecord { .. } => None,
        }
    }
}

impl fmt::Display for ChangeIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeIntent::WriteObject { target, object, .. } => {
                write!(f, "write {} -> {} ({})", object.id, target, object.hash)
            }
            ChangeIntent::DeleteObject { target, id } => write!(f, "delete {} from {}", id, target),
            ChangeIntent::WriteRecord { record } => {
                write!(f, "record {} ({})", record.id, record.local_hash)
            }
            ChangeIntent::DeleteRecord { id } => write!(f, "drop record {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Blake3Hasher;

    #[test]
    fn test_write_object_pairs_record() {
        let object = Object::new("a", 1000, b"v".to_vec()).sealed(&Blake3Hasher);
        let intent = ChangeIntent::write_object(Replica::Remote, object.clone());

        match &intent {
            ChangeIntent::WriteObject { record, .. } => {
                assert_eq!(record.id, object.id);
                assert_eq!(record.local_hash, object.hash);
                assert_eq!(record.remote_hash, object.hash);
            }
            other => panic!("unexpected intent {:?}", other),
        }
        assert_eq!(intent.kind(), IntentKind::WriteObject);
        assert_eq!(intent.target(), Some(Replica::Remote));
        assert_eq!(intent.id(), &object.id);
    }

    #[test]
    fn test_record_intents_have_no_target() {
        let intent = ChangeIntent::DeleteRecord {
            id: ObjectId::from("gone"),
        };
        assert_eq!(intent.target(), None);
        assert_eq!(intent.to_string(), "drop record gone");
    }
}
