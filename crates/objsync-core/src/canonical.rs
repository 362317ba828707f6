//! Canonical CBOR encoding of objects.
//!
//! Objects are encoded as a CBOR map with small integer keys, following
//! RFC 8949 Core Deterministic Encoding:
//! - Map keys in ascending encoded order
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are i64 milliseconds)
//!
//! The same object always produces identical bytes, and therefore an
//! identical [`ContentHash`](crate::ContentHash), on every platform.

use bytes::Bytes;
use ciborium::value::Value;

use crate::error::CoreError;
use crate::types::ObjectId;

/// Object field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const ID: u64 = 0;
    pub const MODIFIED_AT: u64 = 1;
    pub const VALUE: u64 = 2;
}

/// Encode an object's fields to canonical CBOR bytes.
///
/// The hash field is never part of the encoding; it is derived from it.
pub fn canonical_object_bytes(id: &ObjectId, modified_at: i64, value: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(value.len() + id.as_str().len() + 16);

    // Map header: 3 entries, keys already in ascending order
    encode_uint(&mut buf, 5, 3);

    encode_uint(&mut buf, 0, keys::ID);
    encode_text(&mut buf, id.as_str());

    encode_uint(&mut buf, 0, keys::MODIFIED_AT);
    encode_integer(&mut buf, modified_at);

    encode_uint(&mut buf, 0, keys::VALUE);
    encode_bytes(&mut buf, value);

    buf
}

/// Decode canonical object bytes back into `(id, modified_at, value)`.
pub fn decode_object_bytes(bytes: &[u8]) -> Result<(ObjectId, i64, Bytes), CoreError> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    let map = match value {
        Value::Map(m) => m,
        _ => return Err(CoreError::MalformedObject("expected map".into())),
    };

    let get = |key: u64| -> Option<&Value> {
        map.iter()
            .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == key as i128))
            .map(|(_, v)| v)
    };

    let id = match get(keys::ID) {
        Some(Value::Text(s)) => ObjectId::new(s.clone()),
        _ => return Err(CoreError::MalformedObject("missing or invalid id".into())),
    };

    let modified_at = match get(keys::MODIFIED_AT) {
        Some(Value::Integer(i)) => i64::try_from(i128::from(*i))
            .map_err(|_| CoreError::MalformedObject("modified_at out of range".into()))?,
        _ => {
            return Err(CoreError::MalformedObject(
                "missing or invalid modified_at".into(),
            ))
        }
    };

    let payload = match get(keys::VALUE) {
        Some(Value::Bytes(b)) => Bytes::copy_from_slice(b),
        _ => return Err(CoreError::MalformedObject("missing or invalid value".into())),
    };

    Ok((id, modified_at, payload))
}

/// Encode a signed CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, n: i64) {
    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}
