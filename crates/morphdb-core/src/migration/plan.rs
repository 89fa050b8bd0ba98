//! Migration plans - the complete, validated mapping between two snapshots.

use super::error::MappingError;
use super::operation::{MappingOperation, OperationKind};
use morphdb_schema::{EntityId, SchemaSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A complete mapping between two schema snapshots, holding the resolved
/// operations grouped by kind.
///
/// Construction enforces the partition invariant: every entity of the source
/// snapshot is the source of exactly one operation, and every entity of the
/// destination snapshot is the destination of exactly one operation. A plan
/// is immutable once built and can drive any number of runs, so the same plan
/// can back a preview against a scratch store and then the real migration.
#[derive(Debug)]
pub struct MigrationPlan {
    source: SchemaSnapshot,
    destination: SchemaSnapshot,
    operations: HashMap<OperationKind, Vec<MappingOperation>>,
    source_kinds: HashMap<EntityId, OperationKind>,
}

impl MigrationPlan {
    /// Build a plan from an operation list, verifying the partition invariant.
    pub fn new(
        source: SchemaSnapshot,
        destination: SchemaSnapshot,
        operations: Vec<MappingOperation>,
    ) -> Result<Self, MappingError> {
        let mut source_kinds: HashMap<EntityId, OperationKind> = HashMap::new();
        let mut destination_kinds: HashMap<EntityId, OperationKind> = HashMap::new();

        for op in &operations {
            if let Some(id) = op.source() {
                if !source.contains(id) {
                    return Err(MappingError::IncompleteMapping {
                        detail: format!(
                            "{} operation names {id}, which is not in the source snapshot",
                            op.kind()
                        ),
                    });
                }
                if let Some(previous) = source_kinds.insert(id, op.kind()) {
                    return Err(MappingError::ConflictingClaim {
                        entity: id,
                        first: format!("{previous} (as source)"),
                        second: format!("{} (as source)", op.kind()),
                    });
                }
            }
            if let Some(id) = op.destination() {
                if !destination.contains(id) {
                    return Err(MappingError::IncompleteMapping {
                        detail: format!(
                            "{} operation names {id}, which is not in the destination snapshot",
                            op.kind()
                        ),
                    });
                }
                if let Some(previous) = destination_kinds.insert(id, op.kind()) {
                    return Err(MappingError::ConflictingClaim {
                        entity: id,
                        first: format!("{previous} (as destination)"),
                        second: format!("{} (as destination)", op.kind()),
                    });
                }
            }
        }

        for id in source.ids() {
            if !source_kinds.contains_key(&id) {
                let name = entity_name(&source, id);
                return Err(MappingError::IncompleteMapping {
                    detail: format!("source entity {name} ({id}) is consumed by no operation"),
                });
            }
        }
        for id in destination.ids() {
            if !destination_kinds.contains_key(&id) {
                let name = entity_name(&destination, id);
                return Err(MappingError::IncompleteMapping {
                    detail: format!(
                        "destination entity {name} ({id}) is produced by no operation"
                    ),
                });
            }
        }

        let mut grouped: HashMap<OperationKind, Vec<MappingOperation>> = HashMap::new();
        for op in operations {
            grouped.entry(op.kind()).or_default().push(op);
        }

        Ok(Self {
            source,
            destination,
            operations: grouped,
            source_kinds,
        })
    }

    /// The snapshot records are read under.
    pub fn source(&self) -> &SchemaSnapshot {
        &self.source
    }

    /// The snapshot records are written under.
    pub fn destination(&self) -> &SchemaSnapshot {
        &self.destination
    }

    /// All operations, kind by kind in [`OperationKind::ALL`] order and in
    /// resolution order within each kind.
    pub fn operations(&self) -> impl Iterator<Item = &MappingOperation> + '_ {
        OperationKind::ALL
            .into_iter()
            .flat_map(move |kind| self.operations_of(kind))
    }

    /// The operations of one kind, in resolution order.
    pub fn operations_of(&self, kind: OperationKind) -> &[MappingOperation] {
        self.operations.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// How the plan consumes a source entity, if it is part of the plan.
    pub fn source_kind(&self, entity: EntityId) -> Option<OperationKind> {
        self.source_kinds.get(&entity).copied()
    }

    /// Total number of operations.
    pub fn operation_count(&self) -> usize {
        self.operations.values().map(Vec::len).sum()
    }

    /// Check whether the plan has no operations (two empty snapshots).
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// A serializable precis of the plan for preview and diff tooling.
    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary {
            source_version: self.source.version,
            destination_version: self.destination.version,
            deleted: Vec::new(),
            inserted: Vec::new(),
            copied: Vec::new(),
            transformed: Vec::new(),
        };

        for op in self.operations() {
            match op {
                MappingOperation::Delete { source } => {
                    summary.deleted.push(entity_name(&self.source, *source));
                }
                MappingOperation::Insert { destination } => {
                    summary
                        .inserted
                        .push(entity_name(&self.destination, *destination));
                }
                MappingOperation::Copy { destination, .. } => {
                    summary
                        .copied
                        .push(entity_name(&self.destination, *destination));
                }
                MappingOperation::Transform { destination, .. } => {
                    summary
                        .transformed
                        .push(entity_name(&self.destination, *destination));
                }
            }
        }

        summary
    }
}

fn entity_name(snapshot: &SchemaSnapshot, id: EntityId) -> String {
    snapshot
        .entity(id)
        .map(|e| e.name.clone())
        .unwrap_or_else(|| id.to_string())
}

/// Human-facing summary of a migration plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    /// Version of the source snapshot.
    pub source_version: u64,
    /// Version of the destination snapshot.
    pub destination_version: u64,
    /// Names of entities dropped with their records.
    pub deleted: Vec<String>,
    /// Names of entities introduced empty.
    pub inserted: Vec<String>,
    /// Names of entities copied verbatim.
    pub copied: Vec<String>,
    /// Names of entities passing through a transformer.
    pub transformed: Vec<String>,
}
