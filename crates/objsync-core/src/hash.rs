//! Content hashing for replicated objects.
//!
//! The engine never hashes objects itself. Stores compute a [`ContentHash`]
//! on every write through an injected [`ContentHasher`]; discovery only
//! compares the results.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::canonical::canonical_object_bytes;
use crate::error::CoreError;
use crate::types::ObjectId;

/// Domain tag mixed into every object digest.
const OBJECT_DOMAIN: &[u8] = b"objsync-object-v0:";

/// A 32-byte content digest.
///
/// Ordered byte-wise, which gives the conflict resolver a total order to
/// fall back on when modification timestamps tie.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s)?;
        Self::try_from(bytes.as_slice())
    }

    /// The zero hash, carried by objects that no store has sealed yet.
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for ContentHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for ContentHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for ContentHash {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 32] = slice
            .try_into()
            .map_err(|_| CoreError::InvalidHash(format!("expected 32 bytes, got {}", slice.len())))?;
        Ok(Self(arr))
    }
}

/// A deterministic, pure content digest over an object's fields.
///
/// Both replicas of one sync pair must use hashers that agree; the engine
/// copies the winner's hash into the convergence record verbatim.
pub trait ContentHasher: Send + Sync {
    /// Digest an object's identity, modification time and payload.
    fn hash(&self, id: &ObjectId, modified_at: i64, value: &[u8]) -> ContentHash;
}

/// Blake3 over the canonical CBOR encoding of an object.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl ContentHasher for Blake3Hasher {
    fn hash(&self, id: &ObjectId, modified_at: i64, value: &[u8]) -> ContentHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(OBJECT_DOMAIN);
        hasher.update(&canonical_object_bytes(id, modified_at, value));
        ContentHash(*hasher.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake3_hasher_deterministic() {
        let id = ObjectId::from("a");
        let h1 = Blake3Hasher.hash(&id, 1000, b"value");
        let h2 = Blake3Hasher.hash(&id, 1000, b"value");
        assert_eq!(h1, h2);
        assert_ne!(h1, ContentHash::ZERO);
    }

    #[test]
    fn test_blake3_hasher_covers_every_field() {
        let id = ObjectId::from("a");
        let base = Blake3Hasher.hash(&id, 1000, b"value");

        assert_ne!(base, Blake3Hasher.hash(&ObjectId::from("b"), 1000, b"value"));
        assert_ne!(base, Blake3Hasher.hash(&id, 1001, b"value"));
        assert_ne!(base, Blake3Hasher.hash(&id, 1000, b"other"));
    }

    #[test]
    fn test_content_hash_hex_roundtrip() {
        let hash = ContentHash::from_bytes([0x42; 32]);
        let recovered = ContentHash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, recovered);
    }

    #[test]
    fn test_content_hash_rejects_short_input() {
        assert!(ContentHash::from_hex("abcd").is_err());
        assert!(ContentHash::try_from(&[0u8; 31][..]).is_err());
    }

    #[test]
    fn test_content_hash_orders_bytewise() {
        let low = ContentHash::from_bytes([0x01; 32]);
        let high = ContentHash::from_bytes([0x02; 32]);
        assert!(low < high);
    }
}
