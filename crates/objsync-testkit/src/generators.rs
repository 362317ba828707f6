//! Proptest generators for property-based testing.
//!
//! Identifiers and timestamps are drawn from deliberately small ranges so
//! that generated histories collide often: the same identifier edited on
//! both sides, equal timestamps, delete-after-edit.

use proptest::prelude::*;

use objsync_core::{Object, ObjectId, Replica};
use objsync_store::ObjectStore;

use crate::fixtures::ReplicaFixture;

/// Generate an identifier from a small alphabet.
pub fn object_id() -> impl Strategy<Value = ObjectId> {
    "[a-f]".prop_map(ObjectId::from)
}

/// Generate a modification time from a narrow window.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..8
}

/// Generate value bytes of specified max length.
pub fn value(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate an unsealed object.
pub fn object() -> impl Strategy<Value = Object> {
    (object_id(), timestamp(), value(8)).prop_map(|(id, modified_at, value)| Object::new(id, modified_at, value))
}

/// Generate a replica side.
pub fn replica() -> impl Strategy<Value = Replica> {
    prop_oneof![Just(Replica::Local), Just(Replica::Remote)]
}

/// One step of an edit history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Create or overwrite an object on one replica.
    Put { side: Replica, object: Object },
    /// Delete an identifier from one replica.
    Delete { side: Replica, id: ObjectId },
    /// Run a sync between the edits.
    Sync,
}

impl Mutation {
    /// Apply this step to a fixture.
    pub async fn apply(&self, fixture: &ReplicaFixture) -> objsync_sync::Result<()> {
        match self {
            Mutation::Put { side, object } => fixture.replica(*side).set(object).await?,
            Mutation::Delete { side, id } => fixture.replica(*side).delete(id).await?,
            Mutation::Sync => {
                fixture.sync().await?;
            }
        }
        Ok(())
    }
}

/// Generate a single history step. Puts dominate so replicas fill up.
pub fn mutation() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        5 => (replica(), object()).prop_map(|(side, object)| Mutation::Put { side, object }),
        2 => (replica(), object_id()).prop_map(|(side, id)| Mutation::Delete { side, id }),
        1 => Just(Mutation::Sync),
    ]
}

/// Generate an edit history of up to `max_len` steps.
pub fn history(max_len: usize) -> impl Strategy<Value = Vec<Mutation>> {
    prop::collection::vec(mutation(), 0..=max_len)
}

/// Apply every step of a history in order.
pub async fn apply_history(fixture: &ReplicaFixture, history: &[Mutation]) -> objsync_sync::Result<()> {
    for step in history {
        step.apply(fixture).await?;
    }
    Ok(())
}
