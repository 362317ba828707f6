//! Replicated objects and the convergence records that track them.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::hash::{ContentHash, ContentHasher};
use crate::types::ObjectId;

/// A replicated object.
///
/// `hash` is owned by the store: every write recomputes it from the other
/// fields. Two objects with equal `id` and equal `hash` are treated as
/// content-identical without comparing values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    /// Stable identity key, unique within a store.
    pub id: ObjectId,
    /// Content digest as computed by the store that holds this copy.
    pub hash: ContentHash,
    /// Last modification time (Unix ms).
    pub modified_at: i64,
    /// Opaque payload.
    pub value: Bytes,
}

impl Object {
    /// Create an unsealed object (hash is [`ContentHash::ZERO`]).
    pub fn new(id: impl Into<ObjectId>, modified_at: i64, value: impl Into<Bytes>) -> Self {
        Self {
            id: id.into(),
            hash: ContentHash::ZERO,
            modified_at,
            value: value.into(),
        }
    }

    /// Compute this object's hash with the given hasher.
    pub fn compute_hash<H: ContentHasher + ?Sized>(&self, hasher: &H) -> ContentHash {
        hasher.hash(&self.id, self.modified_at, &self.value)
    }

    /// Return the object with its hash recomputed.
    pub fn sealed<H: ContentHasher + ?Sized>(mut self, hasher: &H) -> Self {
        self.hash = self.compute_hash(hasher);
        self
    }

    /// Replace the payload and modification time, leaving the object unsealed.
    pub fn with_value(mut self, modified_at: i64, value: impl Into<Bytes>) -> Self {
        self.modified_at = modified_at;
        self.value = value.into();
        self.hash = ContentHash::ZERO;
        self
    }

    /// Copy the object into freshly allocated storage.
    ///
    /// `Bytes::clone` shares the backing buffer; replicas must never do that.
    pub fn deep_copy(&self) -> Self {
        Self {
            id: self.id.clone(),
            hash: self.hash,
            modified_at: self.modified_at,
            value: Bytes::copy_from_slice(&self.value),
        }
    }
}

/// The hash each replica held the last time both agreed on an identifier.
///
/// A missing record means the identifier was never reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergenceRecord {
    pub id: ObjectId,
    pub local_hash: ContentHash,
    pub remote_hash: ContentHash,
}

impl ConvergenceRecord {
    /// A record stating both replicas hold `hash`.
    pub fn converged(id: ObjectId, hash: ContentHash) -> Self {
        Self {
            id,
            local_hash: hash,
            remote_hash: hash,
        }
    }

    /// Whether both sides recorded the same hash (the steady state).
    pub fn is_settled(&self) -> bool {
        self.local_hash == self.remote_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Blake3Hasher;

    #[test]
    fn test_new_object_is_unsealed() {
        let object = Object::new("a", 1000, b"v".to_vec());
        assert_eq!(object.hash, ContentHash::ZERO);

        let sealed = object.sealed(&Blake3Hasher);
        assert_ne!(sealed.hash, ContentHash::ZERO);
    }

    #[test]
    fn test_with_value_clears_hash() {
        let object = Object::new("a", 1000, b"v".to_vec())
            .sealed(&Blake3Hasher)
            .with_value(2000, b"w".to_vec());
        assert_eq!(object.hash, ContentHash::ZERO);
        assert_eq!(object.modified_at, 2000);
    }

    #[test]
    fn test_deep_copy_does_not_share_buffer() {
        let object = Object::new("a", 1000, b"shared?".to_vec());
        let copy = object.deep_copy();

        assert_eq!(object, copy);
        assert_ne!(object.value.as_ptr(), copy.value.as_ptr());
    }

    #[test]
    fn test_converged_record_is_settled() {
        let hash = ContentHash::from_bytes([7; 32]);
        let record = ConvergenceRecord::converged(ObjectId::from("a"), hash);
        assert!(record.is_settled());

        let drifted = ConvergenceRecord {
            remote_hash: ContentHash::from_bytes([8; 32]),
            ..record
        };
        assert!(!drifted.is_settled());
    }
}
