//! Mapping resolution - from two snapshots to a complete migration plan.

use super::error::MappingError;
use super::operation::{AttributePairing, IdentityTransformer, MappingOperation};
use super::plan::MigrationPlan;
use morphdb_schema::{EntityId, SchemaSnapshot};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;

/// How an entity has been claimed on one side of the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Claim {
    /// Claimed together with a counterpart on the other side.
    Paired(EntityId),
    /// Claimed with no counterpart (deleted or inserted).
    Unavailable,
}

impl Claim {
    fn describe(&self) -> String {
        match self {
            Claim::Paired(other) => format!("paired with {other}"),
            Claim::Unavailable => "consumed with no counterpart".to_string(),
        }
    }
}

/// Resolves two schema snapshots and a set of explicit operations into a
/// complete migration plan.
///
/// Entities are correlated by [`EntityId`] alone; names never enter the
/// comparison, so a renamed entity with a stable identity maps onto itself.
pub struct MappingResolver;

impl MappingResolver {
    /// Resolve a complete plan.
    ///
    /// Explicit operations always win: an entity they claim is never claimed
    /// again by inference, and a contradictory or duplicate explicit claim
    /// fails with [`MappingError::ConflictingClaim`]. Every entity left
    /// unclaimed after inference falls out as a delete (source side) or an
    /// insert (destination side), so the result always covers both snapshots
    /// exactly once.
    pub fn resolve(
        source: SchemaSnapshot,
        destination: SchemaSnapshot,
        explicit: Vec<MappingOperation>,
    ) -> Result<MigrationPlan, MappingError> {
        source.validate()?;
        destination.validate()?;

        let mut claimed_source: HashMap<EntityId, Claim> = HashMap::new();
        let mut claimed_destination: HashMap<EntityId, Claim> = HashMap::new();

        for op in &explicit {
            match (op.source(), op.destination()) {
                (Some(src), Some(dst)) => {
                    claim(&mut claimed_source, src, Claim::Paired(dst))?;
                    claim(&mut claimed_destination, dst, Claim::Paired(src))?;
                }
                (Some(src), None) => claim(&mut claimed_source, src, Claim::Unavailable)?,
                (None, Some(dst)) => claim(&mut claimed_destination, dst, Claim::Unavailable)?,
                (None, None) => {}
            }
        }

        let mut operations = explicit;

        // Entities present in both snapshots and untouched by any explicit
        // operation migrate as identity transforms. An entity claimed on one
        // side only is never re-paired; its other side falls through to the
        // delete/insert sweep below.
        for id in source.ids() {
            if !destination.contains(id) {
                continue;
            }
            if claimed_source.contains_key(&id) || claimed_destination.contains_key(&id) {
                continue;
            }
            let pairings = AttributePairing::matched(&source, &destination, id, id);
            operations.push(MappingOperation::transform(
                id,
                id,
                IdentityTransformer::new(pairings),
            ));
            claimed_source.insert(id, Claim::Paired(id));
            claimed_destination.insert(id, Claim::Paired(id));
        }

        for id in source.ids() {
            if !claimed_source.contains_key(&id) {
                operations.push(MappingOperation::delete(id));
            }
        }
        for id in destination.ids() {
            if !claimed_destination.contains_key(&id) {
                operations.push(MappingOperation::insert(id));
            }
        }

        debug!(
            source_version = source.version,
            destination_version = destination.version,
            operations = operations.len(),
            "mapping resolved"
        );

        MigrationPlan::new(source, destination, operations)
    }
}

fn claim(
    table: &mut HashMap<EntityId, Claim>,
    id: EntityId,
    new: Claim,
) -> Result<(), MappingError> {
    match table.entry(id) {
        Entry::Occupied(existing) => Err(MappingError::ConflictingClaim {
            entity: id,
            first: existing.get().describe(),
            second: new.describe(),
        }),
        Entry::Vacant(slot) => {
            slot.insert(new);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::operation::OperationKind;
    use morphdb_schema::{AttributeDef, AttributeType, EntityDesc, ScalarType};

    fn entity(identity: &str, name: &str) -> EntityDesc {
        EntityDesc::new(name)
            .with_identity(identity)
            .with_attribute(AttributeDef::new(
                "name",
                AttributeType::scalar(ScalarType::String),
            ))
    }

    #[test]
    fn test_unchanged_entity_becomes_identity_transform() {
        let source = SchemaSnapshot::new(1).with_entity(entity("person", "Person"));
        let destination = SchemaSnapshot::new(2).with_entity(entity("person", "Person"));

        let plan = MappingResolver::resolve(source, destination, vec![]).unwrap();

        assert_eq!(plan.operation_count(), 1);
        assert_eq!(
            plan.source_kind(EntityId::derive("person")),
            Some(OperationKind::Transform)
        );
    }

    #[test]
    fn test_removed_entity_becomes_delete() {
        let source = SchemaSnapshot::new(1)
            .with_entity(entity("person", "Person"))
            .with_entity(entity("pet", "Pet"));
        let destination = SchemaSnapshot::new(2).with_entity(entity("person", "Person"));

        let plan = MappingResolver::resolve(source, destination, vec![]).unwrap();

        assert_eq!(
            plan.source_kind(EntityId::derive("pet")),
            Some(OperationKind::Delete)
        );
    }

    #[test]
    fn test_added_entity_becomes_insert() {
        let source = SchemaSnapshot::new(1).with_entity(entity("person", "Person"));
        let destination = SchemaSnapshot::new(2)
            .with_entity(entity("person", "Person"))
            .with_entity(entity("badge", "Badge"));

        let plan = MappingResolver::resolve(source, destination, vec![]).unwrap();

        assert_eq!(plan.operations_of(OperationKind::Insert).len(), 1);
        assert_eq!(plan.operations_of(OperationKind::Transform).len(), 1);
    }

    #[test]
    fn test_renamed_entity_maps_onto_itself() {
        // Identity pinned; the display name change is irrelevant.
        let source = SchemaSnapshot::new(1).with_entity(entity("person", "Person"));
        let destination = SchemaSnapshot::new(2).with_entity(entity("person", "Human"));

        let plan = MappingResolver::resolve(source, destination, vec![]).unwrap();

        assert_eq!(plan.operation_count(), 1);
        assert_eq!(plan.operations_of(OperationKind::Transform).len(), 1);
        assert!(plan.operations_of(OperationKind::Delete).is_empty());
        assert!(plan.operations_of(OperationKind::Insert).is_empty());
    }

    #[test]
    fn test_explicit_claim_wins_over_inference() {
        let person = EntityId::derive("person");
        let source = SchemaSnapshot::new(1).with_entity(entity("person", "Person"));
        let destination = SchemaSnapshot::new(2).with_entity(entity("person", "Person"));

        // Explicitly drop the source side; the destination side must fall out
        // as an insert instead of being re-paired.
        let plan = MappingResolver::resolve(
            source,
            destination,
            vec![MappingOperation::delete(person)],
        )
        .unwrap();

        assert_eq!(plan.source_kind(person), Some(OperationKind::Delete));
        assert_eq!(plan.operations_of(OperationKind::Insert).len(), 1);
        assert!(plan.operations_of(OperationKind::Transform).is_empty());
    }

    #[test]
    fn test_duplicate_explicit_claims_conflict() {
        let person = EntityId::derive("person");
        let source = SchemaSnapshot::new(1).with_entity(entity("person", "Person"));
        let destination = SchemaSnapshot::new(2).with_entity(entity("person", "Person"));

        let err = MappingResolver::resolve(
            source,
            destination,
            vec![
                MappingOperation::delete(person),
                MappingOperation::delete(person),
            ],
        )
        .unwrap_err();

        assert!(matches!(err, MappingError::ConflictingClaim { .. }));
    }

    #[test]
    fn test_contradictory_explicit_claims_conflict() {
        let person = EntityId::derive("person");
        let source = SchemaSnapshot::new(1).with_entity(entity("person", "Person"));
        let destination = SchemaSnapshot::new(2).with_entity(entity("person", "Person"));

        let err = MappingResolver::resolve(
            source,
            destination,
            vec![
                MappingOperation::copy(person, person),
                MappingOperation::delete(person),
            ],
        )
        .unwrap_err();

        assert!(matches!(err, MappingError::ConflictingClaim { .. }));
    }

    #[test]
    fn test_explicit_operation_on_unknown_entity_is_incomplete() {
        let source = SchemaSnapshot::new(1).with_entity(entity("person", "Person"));
        let destination = SchemaSnapshot::new(2).with_entity(entity("person", "Person"));

        let err = MappingResolver::resolve(
            source,
            destination,
            vec![MappingOperation::delete(EntityId::derive("ghost"))],
        )
        .unwrap_err();

        assert!(matches!(err, MappingError::IncompleteMapping { .. }));
    }

    #[test]
    fn test_invalid_snapshot_is_rejected() {
        let source = SchemaSnapshot::new(1)
            .with_entity(EntityDesc::new("Orphan").with_parent(EntityId::derive("missing")));
        let destination = SchemaSnapshot::new(2);

        let err = MappingResolver::resolve(source, destination, vec![]).unwrap_err();
        assert!(matches!(err, MappingError::Schema(_)));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let build = || {
            let source = SchemaSnapshot::new(1)
                .with_entity(entity("a", "A"))
                .with_entity(entity("b", "B"))
                .with_entity(entity("c", "C"));
            let destination = SchemaSnapshot::new(2)
                .with_entity(entity("b", "B"))
                .with_entity(entity("c", "C"))
                .with_entity(entity("d", "D"));
            MappingResolver::resolve(source, destination, vec![]).unwrap()
        };

        let first: Vec<String> = build().operations().map(|op| format!("{op:?}")).collect();
        let second: Vec<String> = build().operations().map(|op| format!("{op:?}")).collect();
        assert_eq!(first, second);
    }
}
