//! Encoding vectors for cross-implementation verification.
//!
//! Every implementation that wants to share convergence records with this
//! one must encode these objects to exactly these bytes, since the default
//! content hash is taken over them.

use objsync_core::{
    canonical_object_bytes, decode_object_bytes, Blake3Hasher, ContentHash, ContentHasher, ObjectId,
};

/// A single encoding vector.
#[derive(Debug, Clone)]
pub struct EncodingVector {
    pub name: &'static str,
    pub description: &'static str,

    // Inputs
    pub id: &'static str,
    pub modified_at: i64,
    pub value: Vec<u8>,

    // Expected canonical CBOR, hex
    pub canonical_hex: &'static str,
}

/// All known vectors.
pub fn all_vectors() -> Vec<EncodingVector> {
    vec![
        EncodingVector {
            name: "minimal",
            description: "one-byte id, zero timestamp, empty value",
            id: "a",
            modified_at: 0,
            value: vec![],
            canonical_hex: "a300616101000240",
        },
        EncodingVector {
            name: "typical",
            description: "millisecond timestamp needs the 8-byte integer form",
            id: "note-1",
            modified_at: 1_700_000_000_000,
            value: b"hello".to_vec(),
            canonical_hex: "a300666e6f74652d31011b0000018bcfe56800024568656c6c6f",
        },
        EncodingVector {
            name: "negative_one",
            description: "negative timestamps use major type 1",
            id: "neg",
            modified_at: -1,
            value: vec![0x00, 0xff],
            canonical_hex: "a300636e65670120024200ff",
        },
        EncodingVector {
            name: "length_boundary",
            description: "non-ASCII id; 24 is the first value needing an extra length byte",
            id: "café",
            modified_at: 24,
            value: vec![b'x'; 24],
            canonical_hex: "a30065636166c3a9011818025818787878787878787878787878787878787878787878787878",
        },
        EncodingVector {
            name: "large_negative",
            description: "negative millisecond timestamp",
            id: "big",
            modified_at: -1_736_870_400_000,
            value: vec![],
            canonical_hex: "a30063626967013b00000194658b0fff0240",
        },
    ]
}

/// Check every vector: encoding, decoding and hash determinism.
pub fn verify_all_vectors() -> Result<(), String> {
    for vector in all_vectors() {
        let id = ObjectId::from(vector.id);
        let bytes = canonical_object_bytes(&id, vector.modified_at, &vector.value);

        if hex::encode(&bytes) != vector.canonical_hex {
            return Err(format!(
                "{}: expected {}, got {}",
                vector.name,
                vector.canonical_hex,
                hex::encode(&bytes)
            ));
        }

        let (decoded_id, decoded_at, decoded_value) =
            decode_object_bytes(&bytes).map_err(|e| format!("{}: {}", vector.name, e))?;
        if decoded_id != id || decoded_at != vector.modified_at || decoded_value[..] != vector.value[..] {
            return Err(format!("{}: decoded fields differ", vector.name));
        }

        let hash = Blake3Hasher.hash(&id, vector.modified_at, &vector.value);
        if hash == ContentHash::ZERO {
            return Err(format!("{}: zero hash", vector.name));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectors_verify() {
        verify_all_vectors().unwrap();
    }

    #[test]
    fn test_vector_hashes_distinct() {
        let hashes: std::collections::BTreeSet<ContentHash> = all_vectors()
            .iter()
            .map(|v| Blake3Hasher.hash(&ObjectId::from(v.id), v.modified_at, &v.value))
            .collect();
        assert_eq!(hashes.len(), all_vectors().len());
    }
}
