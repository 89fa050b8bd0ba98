//! In-memory record store.

use super::{ReadableStore, StoreLocation, WritableStore};
use crate::error::StoreError;
use morphdb_schema::{EntityId, FieldValue, InstanceId};
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
struct InstanceData {
    attributes: HashMap<String, FieldValue>,
    relationships: HashMap<String, Vec<InstanceId>>,
}

/// A record store held entirely in memory.
///
/// Implements both store traits, so it serves as a migration source, a
/// migration destination, and the reference semantics the disk store is
/// tested against. Commit seals the store against further writes; the
/// contents stay readable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<InstanceId, InstanceData>,
    by_entity: HashMap<EntityId, Vec<InstanceId>>,
    next_seq: u64,
    sealed: bool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of instances across all entities.
    pub fn instance_count(&self) -> usize {
        self.records.len()
    }

    fn record(&self, instance: InstanceId) -> Result<&InstanceData, StoreError> {
        self.records
            .get(&instance)
            .ok_or(StoreError::UnknownInstance { instance })
    }

    fn record_mut(&mut self, instance: InstanceId) -> Result<&mut InstanceData, StoreError> {
        self.records
            .get_mut(&instance)
            .ok_or(StoreError::UnknownInstance { instance })
    }

    fn check_open(&self) -> Result<(), StoreError> {
        if self.sealed {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

impl ReadableStore for MemoryStore {
    fn instances(&self, entity: EntityId) -> Result<Vec<InstanceId>, StoreError> {
        Ok(self.by_entity.get(&entity).cloned().unwrap_or_default())
    }

    fn read_attribute(
        &self,
        instance: InstanceId,
        attribute: &str,
    ) -> Result<FieldValue, StoreError> {
        let record = self.record(instance)?;
        Ok(record
            .attributes
            .get(attribute)
            .cloned()
            .unwrap_or(FieldValue::Null))
    }

    fn read_relationship(
        &self,
        instance: InstanceId,
        relationship: &str,
    ) -> Result<Vec<InstanceId>, StoreError> {
        let record = self.record(instance)?;
        Ok(record
            .relationships
            .get(relationship)
            .cloned()
            .unwrap_or_default())
    }
}

impl WritableStore for MemoryStore {
    fn create_instance(&mut self, entity: EntityId) -> Result<InstanceId, StoreError> {
        self.check_open()?;
        self.next_seq += 1;
        let instance = InstanceId::from_sequence(self.next_seq);
        self.records.insert(instance, InstanceData::default());
        self.by_entity.entry(entity).or_default().push(instance);
        Ok(instance)
    }

    fn write_attribute(
        &mut self,
        instance: InstanceId,
        attribute: &str,
        value: FieldValue,
    ) -> Result<(), StoreError> {
        self.check_open()?;
        let record = self.record_mut(instance)?;
        record.attributes.insert(attribute.to_string(), value);
        Ok(())
    }

    fn write_relationship(
        &mut self,
        instance: InstanceId,
        relationship: &str,
        targets: &[InstanceId],
    ) -> Result<(), StoreError> {
        self.check_open()?;
        let record = self.record_mut(instance)?;
        record
            .relationships
            .insert(relationship.to_string(), targets.to_vec());
        Ok(())
    }

    fn commit(&mut self) -> Result<StoreLocation, StoreError> {
        self.check_open()?;
        self.sealed = true;
        Ok(StoreLocation::Memory)
    }

    fn discard(&mut self) {
        self.records.clear();
        self.by_entity.clear();
        self.sealed = true;
    }
}
