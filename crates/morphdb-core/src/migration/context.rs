//! Per-record transform context.

use super::error::TransformError;
use crate::store::{ReadableStore, WritableStore};
use morphdb_schema::{EntityId, FieldValue, InstanceId};

/// Destination-side state of one record transform.
///
/// The destination instance is created lazily and at most once; this enum
/// makes the two possible states explicit instead of hiding them in captured
/// mutable flags.
enum DestinationState {
    /// No destination record yet; creating now would be the first time.
    Uncreated,
    /// The destination record exists under this handle.
    Created(InstanceId),
}

/// The window a [`RecordTransformer`] works through for one source record.
///
/// Reads go against the frozen source store; writes go into the staged
/// destination store. The destination record does not exist until the
/// transformer asks for it: a transformer that returns without creating it
/// (explicitly or via a write) filters the record out of the migration, and
/// every relationship that pointed at the source record is dropped in the
/// relationship pass.
///
/// [`RecordTransformer`]: super::operation::RecordTransformer
pub struct TransformContext<'a> {
    source_store: &'a dyn ReadableStore,
    destination_store: &'a mut dyn WritableStore,
    destination_entity: EntityId,
    source_instance: InstanceId,
    state: DestinationState,
}

impl<'a> TransformContext<'a> {
    pub(crate) fn new(
        source_store: &'a dyn ReadableStore,
        destination_store: &'a mut dyn WritableStore,
        destination_entity: EntityId,
        source_instance: InstanceId,
    ) -> Self {
        Self {
            source_store,
            destination_store,
            destination_entity,
            source_instance,
            state: DestinationState::Uncreated,
        }
    }

    /// The source record being migrated.
    pub fn source_instance(&self) -> InstanceId {
        self.source_instance
    }

    /// The entity the destination record belongs to.
    pub fn destination_entity(&self) -> EntityId {
        self.destination_entity
    }

    /// Read an attribute of the source record. Absent attributes read as
    /// [`FieldValue::Null`].
    pub fn read_source(&self, attribute: &str) -> Result<FieldValue, TransformError> {
        Ok(self
            .source_store
            .read_attribute(self.source_instance, attribute)?)
    }

    /// Read the target handles of a source relationship, in stored order.
    pub fn read_source_refs(&self, relationship: &str) -> Result<Vec<InstanceId>, TransformError> {
        Ok(self
            .source_store
            .read_relationship(self.source_instance, relationship)?)
    }

    /// Create the destination record, or return the handle already created.
    ///
    /// However many times this is called, exactly one destination record
    /// exists afterwards.
    pub fn create_destination(&mut self) -> Result<InstanceId, TransformError> {
        match self.state {
            DestinationState::Created(instance) => Ok(instance),
            DestinationState::Uncreated => {
                let instance = self
                    .destination_store
                    .create_instance(self.destination_entity)?;
                self.state = DestinationState::Created(instance);
                Ok(instance)
            }
        }
    }

    /// Write an attribute of the destination record, creating it first if
    /// the transformer has not yet done so.
    pub fn write_destination(
        &mut self,
        attribute: &str,
        value: FieldValue,
    ) -> Result<(), TransformError> {
        let instance = self.create_destination()?;
        self.destination_store
            .write_attribute(instance, attribute, value)?;
        Ok(())
    }

    /// The destination record produced so far, if any.
    pub fn destination(&self) -> Option<InstanceId> {
        match self.state {
            DestinationState::Created(instance) => Some(instance),
            DestinationState::Uncreated => None,
        }
    }
}
