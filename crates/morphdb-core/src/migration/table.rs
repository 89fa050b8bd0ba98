//! Association table linking source instances to their migrated counterparts.

use super::error::MigrationError;
use morphdb_schema::{EntityId, InstanceId};
use std::collections::HashMap;

/// One recorded association between a source instance and the destination
/// instance its transformer produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociationEntry {
    /// Entity the source instance belongs to.
    pub source_entity: EntityId,
    /// Entity the destination instance belongs to.
    pub destination_entity: EntityId,
    /// The migrated source instance.
    pub source: InstanceId,
    /// The instance written into the destination store.
    pub destination: InstanceId,
}

/// Maps every migrated source instance to its destination instance, if any.
///
/// Built during the attribute pass and consulted during the relationship
/// pass. The lookup distinguishes three cases: a source instance mapped to a
/// destination (`Some(Some(_))`), a source instance its transformer chose to
/// drop (`Some(None)`), and a source instance no operation ever visited
/// (`None`).
#[derive(Debug, Default)]
pub struct AssociationTable {
    forward: HashMap<(EntityId, InstanceId), Option<InstanceId>>,
    created: Vec<AssociationEntry>,
}

impl AssociationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for one source instance. `None` means the
    /// transformer ran and produced nothing.
    ///
    /// Each source instance may be recorded exactly once.
    pub fn record(
        &mut self,
        source_entity: EntityId,
        destination_entity: EntityId,
        source: InstanceId,
        destination: Option<InstanceId>,
    ) -> Result<(), MigrationError> {
        if self
            .forward
            .insert((source_entity, source), destination)
            .is_some()
        {
            return Err(MigrationError::DuplicateAssociation {
                entity: source_entity,
                instance: source,
            });
        }
        if let Some(destination) = destination {
            self.created.push(AssociationEntry {
                source_entity,
                destination_entity,
                source,
                destination,
            });
        }
        Ok(())
    }

    /// Look up the outcome for a source instance.
    ///
    /// Outer `None`: the instance was never migrated. Inner `None`: it was
    /// migrated but deliberately dropped.
    pub fn lookup(&self, source_entity: EntityId, source: InstanceId) -> Option<Option<InstanceId>> {
        self.forward.get(&(source_entity, source)).copied()
    }

    /// Entries that produced a destination instance, in creation order.
    pub fn created(&self) -> &[AssociationEntry] {
        &self.created
    }

    /// Number of recorded source instances, dropped ones included.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Check whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}
