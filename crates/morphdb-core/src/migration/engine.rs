//! Two-phase migration execution.

use super::error::MigrationError;
use super::operation::{AttributePairing, MappingOperation, OperationKind, RecordTransformer};
use super::plan::MigrationPlan;
use super::table::AssociationTable;
use crate::migration::context::TransformContext;
use crate::store::{ReadableStore, StoreLocation, WritableStore};
use morphdb_schema::EntityId;
use tracing::debug;

/// Executes a [`MigrationPlan`] against a pair of stores.
///
/// A run is all-or-nothing: the destination store is only committed after
/// both passes finish, and any error discards everything staged so far. The
/// source store is never written.
#[derive(Debug, Default)]
pub struct MigrationEngine;

impl MigrationEngine {
    /// Create an engine.
    pub fn new() -> Self {
        Self
    }

    /// Run the plan and publish the destination store.
    ///
    /// Phase one walks the plan's operations and migrates attributes,
    /// building the association table as it goes. Phase two replays every
    /// relationship of every created record through that table. On success
    /// the destination is committed and its location returned.
    pub fn execute(
        &self,
        plan: &MigrationPlan,
        source: &dyn ReadableStore,
        destination: &mut dyn WritableStore,
    ) -> Result<StoreLocation, MigrationError> {
        match self.run(plan, source, destination) {
            Ok(()) => match destination.commit() {
                Ok(location) => Ok(location),
                Err(e) => {
                    destination.discard();
                    Err(e.into())
                }
            },
            Err(e) => {
                destination.discard();
                Err(e)
            }
        }
    }

    fn run(
        &self,
        plan: &MigrationPlan,
        source: &dyn ReadableStore,
        destination: &mut dyn WritableStore,
    ) -> Result<(), MigrationError> {
        let mut table = AssociationTable::new();

        debug!(operations = plan.operation_count(), "attribute pass");
        for op in plan.operations() {
            match op {
                // No records move for these; deletes still shape the
                // relationship pass through the plan's kind lookup.
                MappingOperation::Delete { .. } | MappingOperation::Insert { .. } => {}
                MappingOperation::Copy {
                    source: src,
                    destination: dst,
                } => {
                    self.copy_entity(plan, source, &mut *destination, &mut table, *src, *dst)?;
                }
                MappingOperation::Transform {
                    source: src,
                    destination: dst,
                    transformer,
                } => {
                    self.transform_entity(
                        source,
                        &mut *destination,
                        &mut table,
                        *src,
                        *dst,
                        transformer.as_ref(),
                    )?;
                }
            }
        }

        debug!(associations = table.len(), "relationship pass");
        self.rebuild_relationships(plan, source, destination, &table)
    }

    fn copy_entity(
        &self,
        plan: &MigrationPlan,
        source: &dyn ReadableStore,
        destination: &mut dyn WritableStore,
        table: &mut AssociationTable,
        source_entity: EntityId,
        destination_entity: EntityId,
    ) -> Result<(), MigrationError> {
        let pairings = AttributePairing::matched(
            plan.source(),
            plan.destination(),
            source_entity,
            destination_entity,
        );
        for instance in source.instances(source_entity)? {
            let created = destination.create_instance(destination_entity)?;
            for pairing in &pairings {
                let value = source.read_attribute(instance, &pairing.source)?;
                if !value.is_null() {
                    destination.write_attribute(created, &pairing.destination, value)?;
                }
            }
            table.record(source_entity, destination_entity, instance, Some(created))?;
        }
        Ok(())
    }

    fn transform_entity(
        &self,
        source: &dyn ReadableStore,
        destination: &mut dyn WritableStore,
        table: &mut AssociationTable,
        source_entity: EntityId,
        destination_entity: EntityId,
        transformer: &dyn RecordTransformer,
    ) -> Result<(), MigrationError> {
        for instance in source.instances(source_entity)? {
            let mut ctx =
                TransformContext::new(source, &mut *destination, destination_entity, instance);
            transformer
                .transform(&mut ctx)
                .map_err(|e| MigrationError::Transformer {
                    entity: source_entity,
                    instance,
                    source: e,
                })?;
            let produced = ctx.destination();
            table.record(source_entity, destination_entity, instance, produced)?;
        }
        Ok(())
    }

    fn rebuild_relationships(
        &self,
        plan: &MigrationPlan,
        source: &dyn ReadableStore,
        destination: &mut dyn WritableStore,
        table: &AssociationTable,
    ) -> Result<(), MigrationError> {
        for entry in table.created() {
            let Some(dest_desc) = plan.destination().entity(entry.destination_entity) else {
                continue;
            };
            let Some(source_desc) = plan.source().entity(entry.source_entity) else {
                continue;
            };

            for relationship in &dest_desc.relationships {
                // A relationship new in this version has nothing to carry
                // over; populating it is the caller's concern.
                let Some(source_rel) = source_desc.relationship(&relationship.name) else {
                    continue;
                };

                let targets = source.read_relationship(entry.source, &source_rel.name)?;
                let mut mapped = Vec::with_capacity(targets.len());
                for target in targets {
                    match table.lookup(source_rel.destination, target) {
                        Some(Some(destination_target)) => mapped.push(destination_target),
                        // The transformer dropped this target.
                        Some(None) => {}
                        None => {
                            if plan.source_kind(source_rel.destination)
                                == Some(OperationKind::Delete)
                            {
                                // The whole target entity was dropped.
                                continue;
                            }
                            return Err(MigrationError::Integrity {
                                entity: entry.destination_entity,
                                instance: entry.destination,
                                relationship: relationship.name.clone(),
                                target,
                            });
                        }
                    }
                }

                if !relationship.is_to_many() && mapped.len() > 1 {
                    return Err(MigrationError::CardinalityOverflow {
                        entity: entry.destination_entity,
                        relationship: relationship.name.clone(),
                        targets: mapped.len(),
                    });
                }
                if !mapped.is_empty() {
                    destination.write_relationship(entry.destination, &relationship.name, &mapped)?;
                }
            }
        }
        Ok(())
    }
}
