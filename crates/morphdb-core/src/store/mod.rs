//! Record stores the migration engine reads from and writes into.
//!
//! A migration run consumes one [`ReadableStore`] (the current data) and
//! builds one [`WritableStore`] (the next data). The two sides are kept as
//! separate traits so a run can pair any source with any destination, and so
//! the engine never holds a write path into the source.

mod config;
mod disk;
mod memory;

pub use config::StoreConfig;
pub use disk::DiskStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use morphdb_schema::{EntityId, FieldValue, InstanceId};
use std::path::PathBuf;

/// Where a committed store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// The store exists only in memory.
    Memory,
    /// The store lives at this directory.
    Path(PathBuf),
}

/// Read access to a record store.
pub trait ReadableStore {
    /// All instances of an entity, in a stable order.
    fn instances(&self, entity: EntityId) -> Result<Vec<InstanceId>, StoreError>;

    /// Read one attribute of an instance.
    ///
    /// An attribute the instance never stored reads as [`FieldValue::Null`];
    /// only an unknown handle is an error.
    fn read_attribute(
        &self,
        instance: InstanceId,
        attribute: &str,
    ) -> Result<FieldValue, StoreError>;

    /// Read the target handles of a relationship, preserving stored order.
    ///
    /// A relationship the instance never stored reads as empty.
    fn read_relationship(
        &self,
        instance: InstanceId,
        relationship: &str,
    ) -> Result<Vec<InstanceId>, StoreError>;
}

/// Write access to a store under construction.
///
/// Writable stores are build-then-seal: every write lands in an isolated
/// staging area, and [`commit`](Self::commit) publishes the whole store in
/// one step. After commit or [`discard`](Self::discard) the store rejects
/// further writes with [`StoreError::Closed`].
pub trait WritableStore {
    /// Create a fresh instance of an entity and return its handle.
    fn create_instance(&mut self, entity: EntityId) -> Result<InstanceId, StoreError>;

    /// Write one attribute value, replacing any previous value.
    fn write_attribute(
        &mut self,
        instance: InstanceId,
        attribute: &str,
        value: FieldValue,
    ) -> Result<(), StoreError>;

    /// Write the full target list of a relationship, replacing any previous.
    fn write_relationship(
        &mut self,
        instance: InstanceId,
        relationship: &str,
        targets: &[InstanceId],
    ) -> Result<(), StoreError>;

    /// Seal the store and publish it, returning where it now lives.
    fn commit(&mut self) -> Result<StoreLocation, StoreError>;

    /// Abandon the store, removing anything staged so far.
    fn discard(&mut self);
}

/// Current time in microseconds since the Unix epoch.
pub(crate) fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
