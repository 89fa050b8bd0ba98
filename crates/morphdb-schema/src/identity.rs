//! Stable identifiers for entities and record instances.

use rkyv::{Archive, Deserialize, Serialize};
use std::fmt;

/// Stable identifier for an entity description.
///
/// An `EntityId` is derived from the entity's persistent identity string and
/// never changes across schema versions, even when the entity's display name
/// does. Two snapshots describe "the same" entity exactly when the ids match;
/// names play no part in version correlation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Archive, Serialize, Deserialize)]
pub struct EntityId([u8; 16]);

impl EntityId {
    /// Derive an id from a persistent identity string.
    ///
    /// The derivation is a pure function of the string: the same identity
    /// always yields the same id, on any machine, in any process.
    pub fn derive(identity: &str) -> Self {
        let hash = blake3::hash(identity.as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash.as_bytes()[..16]);
        EntityId(bytes)
    }

    /// Construct an id from raw bytes.
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        EntityId(bytes)
    }

    /// The raw bytes of this id.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", hex::encode(&self.0[..6]))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Handle for one record instance within one store.
///
/// Assigned by the store that owns the record and unique within it. A handle
/// carries no meaning in any other store; migration keeps an explicit
/// source-to-destination association table instead of reusing handles.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Archive, Serialize, Deserialize)]
pub struct InstanceId([u8; 16]);

impl InstanceId {
    /// Construct a handle from raw bytes.
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        InstanceId(bytes)
    }

    /// Construct a handle from a store-local sequence number.
    pub fn from_sequence(seq: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[8..].copy_from_slice(&seq.to_be_bytes());
        InstanceId(bytes)
    }

    /// The raw bytes of this handle.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceId({})", hex::encode(&self.0[..6]))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
