//! Schema snapshots - versioned, immutable descriptions of a whole schema.

use crate::attribute::AttributeDef;
use crate::entity::EntityDesc;
use crate::error::SchemaError;
use crate::identity::EntityId;
use rkyv::{Archive, Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A versioned snapshot of the entire schema.
///
/// Snapshots are value objects: once built they are never mutated. Migration
/// compares two snapshots purely by the [`EntityId`]s they contain.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    /// Schema version (monotonically increasing).
    pub version: u64,
    /// Entity descriptions.
    pub entities: Vec<EntityDesc>,
}

impl SchemaSnapshot {
    /// Create an empty snapshot.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            entities: Vec::new(),
        }
    }

    /// Add an entity to the snapshot.
    pub fn with_entity(mut self, entity: EntityDesc) -> Self {
        self.entities.push(entity);
        self
    }

    /// Get an entity by id.
    pub fn entity(&self, id: EntityId) -> Option<&EntityDesc> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Get an entity by display name.
    pub fn entity_named(&self, name: &str) -> Option<&EntityDesc> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Check whether the snapshot contains an entity.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entity(id).is_some()
    }

    /// All entity ids, sorted for deterministic iteration.
    pub fn ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.iter().map(|e| e.id).collect();
        ids.sort();
        ids
    }

    /// Number of entities in the snapshot.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check whether the snapshot has no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Attributes of an entity merged down its parent chain.
    ///
    /// A child attribute shadows a parent attribute of the same name. Returns
    /// an empty list for an unknown id. The walk stops if it revisits an
    /// entity, so a malformed snapshot cannot loop; [`validate`](Self::validate)
    /// reports such cycles properly.
    pub fn effective_attributes(&self, id: EntityId) -> Vec<&AttributeDef> {
        let mut merged: Vec<&AttributeDef> = Vec::new();
        let mut seen_names: HashSet<&str> = HashSet::new();
        let mut visited: HashSet<EntityId> = HashSet::new();
        let mut cursor = Some(id);

        while let Some(current) = cursor {
            if !visited.insert(current) {
                break;
            }
            let Some(entity) = self.entity(current) else {
                break;
            };
            for attr in &entity.attributes {
                if seen_names.insert(&attr.name) {
                    merged.push(attr);
                }
            }
            cursor = entity.parent;
        }

        merged
    }

    /// Validate snapshot invariants.
    ///
    /// Checks id uniqueness, attribute/relationship name uniqueness per
    /// entity, parent references and acyclicity, renaming-identifier
    /// uniqueness among each entity's persisted effective attributes,
    /// relationship destinations, and inverse symmetry. A relationship
    /// without a declared inverse is fine (unidirectional); an inverse that
    /// exists but points at a third entity is not.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut ids: HashMap<EntityId, &str> = HashMap::new();
        for entity in &self.entities {
            if let Some(first) = ids.insert(entity.id, &entity.name) {
                return Err(SchemaError::DuplicateEntity {
                    id: entity.id,
                    first: first.to_string(),
                    second: entity.name.clone(),
                });
            }
        }

        for entity in &self.entities {
            let mut attr_names = HashSet::new();
            for attr in &entity.attributes {
                if !attr_names.insert(attr.name.as_str()) {
                    return Err(SchemaError::DuplicateAttribute {
                        entity: entity.name.clone(),
                        attribute: attr.name.clone(),
                    });
                }
            }

            let mut rel_names = HashSet::new();
            for rel in &entity.relationships {
                if !rel_names.insert(rel.name.as_str()) {
                    return Err(SchemaError::DuplicateRelationship {
                        entity: entity.name.clone(),
                        relationship: rel.name.clone(),
                    });
                }
            }

            if let Some(parent) = entity.parent {
                if !self.contains(parent) {
                    return Err(SchemaError::UnknownParent {
                        entity: entity.name.clone(),
                        parent,
                    });
                }
            }
        }

        for entity in &self.entities {
            let mut visited = HashSet::new();
            let mut cursor = Some(entity.id);
            while let Some(current) = cursor {
                if !visited.insert(current) {
                    return Err(SchemaError::ParentCycle {
                        entity: entity.name.clone(),
                    });
                }
                cursor = self.entity(current).and_then(|e| e.parent);
            }
        }

        for entity in &self.entities {
            let mut renaming_ids: HashMap<&str, &str> = HashMap::new();
            for attr in self.effective_attributes(entity.id) {
                // Transient attributes never pair across versions, so a
                // shared identifier on one of them is harmless.
                if attr.is_transient() {
                    continue;
                }
                if let Some(first) = renaming_ids.insert(attr.renaming_id(), &attr.name) {
                    return Err(SchemaError::DuplicateRenamingIdentifier {
                        entity: entity.name.clone(),
                        first: first.to_string(),
                        second: attr.name.clone(),
                        identifier: attr.renaming_id().to_string(),
                    });
                }
            }
        }

        for entity in &self.entities {
            for rel in &entity.relationships {
                let Some(destination) = self.entity(rel.destination) else {
                    return Err(SchemaError::UnknownDestination {
                        entity: entity.name.clone(),
                        relationship: rel.name.clone(),
                        destination: rel.destination,
                    });
                };
                if let Some(inverse_name) = &rel.inverse_name {
                    if let Some(inverse) = destination.relationship(inverse_name) {
                        if inverse.destination != entity.id {
                            return Err(SchemaError::AsymmetricInverse {
                                entity: entity.name.clone(),
                                relationship: rel.name.clone(),
                                inverse: inverse_name.clone(),
                            });
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeTrait;
    use crate::relationship::RelationshipDef;
    use crate::types::{AttributeType, ScalarType};

    fn sample_snapshot() -> SchemaSnapshot {
        let person_id = EntityId::derive("person");
        let pet_id = EntityId::derive("pet");

        let person = EntityDesc::new("Person")
            .with_identity("person")
            .with_attribute(AttributeDef::new(
                "name",
                AttributeType::scalar(ScalarType::String),
            ))
            .with_attribute(AttributeDef::new(
                "age",
                AttributeType::scalar(ScalarType::Int32),
            ))
            .with_relationship(RelationshipDef::to_many("pets", pet_id).with_inverse("owner"));

        let pet = EntityDesc::new("Pet")
            .with_identity("pet")
            .with_attribute(AttributeDef::new(
                "name",
                AttributeType::scalar(ScalarType::String),
            ))
            .with_relationship(RelationshipDef::to_one("owner", person_id).with_inverse("pets"));

        SchemaSnapshot::new(1).with_entity(person).with_entity(pet)
    }

    #[test]
    fn test_snapshot_builder() {
        let snapshot = sample_snapshot();

        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains(EntityId::derive("person")));
        assert!(snapshot.entity_named("Pet").is_some());
        assert!(snapshot.entity_named("Car").is_none());
    }

    #[test]
    fn test_validate_sample() {
        assert!(sample_snapshot().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_entity() {
        let snapshot = SchemaSnapshot::new(1)
            .with_entity(EntityDesc::new("Person").with_identity("person"))
            .with_entity(EntityDesc::new("Human").with_identity("person"));

        assert!(matches!(
            snapshot.validate(),
            Err(SchemaError::DuplicateEntity { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_parent() {
        let snapshot = SchemaSnapshot::new(1)
            .with_entity(EntityDesc::new("Dog").with_parent(EntityId::derive("animal")));

        assert!(matches!(
            snapshot.validate(),
            Err(SchemaError::UnknownParent { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_parent_cycle() {
        let a = EntityId::derive("a");
        let b = EntityId::derive("b");
        let snapshot = SchemaSnapshot::new(1)
            .with_entity(EntityDesc::new("a").with_parent(b))
            .with_entity(EntityDesc::new("b").with_parent(a));

        assert!(matches!(
            snapshot.validate(),
            Err(SchemaError::ParentCycle { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_destination() {
        let snapshot = SchemaSnapshot::new(1).with_entity(
            EntityDesc::new("Person")
                .with_relationship(RelationshipDef::to_many("pets", EntityId::derive("pet"))),
        );

        assert!(matches!(
            snapshot.validate(),
            Err(SchemaError::UnknownDestination { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_asymmetric_inverse() {
        let person_id = EntityId::derive("person");
        let toy_id = EntityId::derive("toy");

        // Pet.owner claims "pets" as inverse, but Person.pets points at Toy.
        let snapshot = SchemaSnapshot::new(1)
            .with_entity(
                EntityDesc::new("Person")
                    .with_identity("person")
                    .with_relationship(RelationshipDef::to_many("pets", toy_id)),
            )
            .with_entity(
                EntityDesc::new("Pet")
                    .with_identity("pet")
                    .with_relationship(
                        RelationshipDef::to_one("owner", person_id).with_inverse("pets"),
                    ),
            )
            .with_entity(EntityDesc::new("Toy").with_identity("toy"));

        assert!(matches!(
            snapshot.validate(),
            Err(SchemaError::AsymmetricInverse { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_renaming_identifier() {
        // Two attributes answering for the old "age" name would make
        // cross-version matching ambiguous.
        let snapshot = SchemaSnapshot::new(2).with_entity(
            EntityDesc::new("Person")
                .with_identity("person")
                .with_attribute(
                    AttributeDef::new("years", AttributeType::scalar(ScalarType::Int32))
                        .with_renaming_identifier("age"),
                )
                .with_attribute(
                    AttributeDef::new("yearsOld", AttributeType::scalar(ScalarType::Int32))
                        .with_renaming_identifier("age"),
                ),
        );

        assert!(matches!(
            snapshot.validate(),
            Err(SchemaError::DuplicateRenamingIdentifier { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_inherited_renaming_identifier_clash() {
        let animal_id = EntityId::derive("animal");
        let snapshot = SchemaSnapshot::new(2)
            .with_entity(
                EntityDesc::new("Animal")
                    .with_identity("animal")
                    .with_attribute(AttributeDef::new(
                        "age",
                        AttributeType::scalar(ScalarType::Int32),
                    )),
            )
            .with_entity(
                EntityDesc::new("Dog")
                    .with_identity("dog")
                    .with_parent(animal_id)
                    .with_attribute(
                        AttributeDef::new("years", AttributeType::scalar(ScalarType::Int32))
                            .with_renaming_identifier("age"),
                    ),
            );

        assert!(matches!(
            snapshot.validate(),
            Err(SchemaError::DuplicateRenamingIdentifier { .. })
        ));
    }

    #[test]
    fn test_transient_attribute_may_share_renaming_identifier() {
        let snapshot = SchemaSnapshot::new(2).with_entity(
            EntityDesc::new("Person")
                .with_identity("person")
                .with_attribute(AttributeDef::new(
                    "age",
                    AttributeType::scalar(ScalarType::Int32),
                ))
                .with_attribute(
                    AttributeDef::new("displayAge", AttributeType::scalar(ScalarType::String))
                        .with_trait(AttributeTrait::Transient)
                        .with_renaming_identifier("age"),
                ),
        );

        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_missing_inverse_is_tolerated() {
        let person_id = EntityId::derive("person");
        let snapshot = SchemaSnapshot::new(1)
            .with_entity(EntityDesc::new("Person").with_identity("person"))
            .with_entity(
                EntityDesc::new("Pet")
                    .with_identity("pet")
                    .with_relationship(
                        RelationshipDef::to_one("owner", person_id).with_inverse("pets"),
                    ),
            );

        // Person declares no "pets" relationship at all: unidirectional, valid.
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_effective_attributes_inherit_and_shadow() {
        let animal_id = EntityId::derive("animal");
        let snapshot = SchemaSnapshot::new(1)
            .with_entity(
                EntityDesc::new("Animal")
                    .with_identity("animal")
                    .with_attribute(AttributeDef::new(
                        "name",
                        AttributeType::scalar(ScalarType::String),
                    ))
                    .with_attribute(AttributeDef::new(
                        "legs",
                        AttributeType::scalar(ScalarType::Int32),
                    )),
            )
            .with_entity(
                EntityDesc::new("Dog")
                    .with_identity("dog")
                    .with_parent(animal_id)
                    .with_attribute(AttributeDef::new(
                        "name",
                        AttributeType::optional_scalar(ScalarType::String),
                    ))
                    .with_attribute(AttributeDef::new(
                        "breed",
                        AttributeType::scalar(ScalarType::String),
                    )),
            );

        let attrs = snapshot.effective_attributes(EntityId::derive("dog"));
        let names: Vec<&str> = attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["name", "breed", "legs"]);

        // The child's "name" shadows the parent's.
        let name = attrs.iter().find(|a| a.name == "name").unwrap();
        assert!(name.ty.is_nullable());
    }
}
