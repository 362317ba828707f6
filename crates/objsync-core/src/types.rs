//! Strong type definitions for objsync.
//!
//! Identifiers are newtypes so an object ID can't be confused with an
//! arbitrary string at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The stable identity key of an object, unique within one store.
///
/// Ordered lexicographically; discovery walks identifiers in this order.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(String);

impl ObjectId {
    /// Create a new ObjectId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One of the two replicas taking part in a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Replica {
    Local,
    Remote,
}

impl Replica {
    /// The opposite replica.
    pub const fn other(self) -> Self {
        match self {
            Replica::Local => Replica::Remote,
            Replica::Remote => Replica::Local,
        }
    }
}

impl fmt::Display for Replica {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replica::Local => f.write_str("local"),
            Replica::Remote => f.write_str("remote"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_ordering() {
        let mut ids = vec![ObjectId::from("b"), ObjectId::from("a"), ObjectId::from("c")];
        ids.sort();
        assert_eq!(ids, vec![ObjectId::from("a"), ObjectId::from("b"), ObjectId::from("c")]);
    }

    #[test]
    fn test_object_id_display() {
        let id = ObjectId::new("note-42");
        assert_eq!(format!("{}", id), "note-42");
        assert_eq!(format!("{:?}", id), "ObjectId(note-42)");
    }

    #[test]
    fn test_replica_other() {
        assert_eq!(Replica::Local.other(), Replica::Remote);
        assert_eq!(Replica::Remote.other(), Replica::Local);
    }
}
