//! Entity descriptions.

use crate::attribute::AttributeDef;
use crate::identity::EntityId;
use crate::relationship::RelationshipDef;
use rkyv::{Archive, Deserialize, Serialize};

/// An entity description within a schema snapshot.
///
/// The `id` is the entity's identity across schema versions; the `name` is
/// presentation only and free to change between versions.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct EntityDesc {
    /// Stable identity across schema versions.
    pub id: EntityId,
    /// Display name (unique within one snapshot, not correlated across them).
    pub name: String,
    /// Parent entity for attribute inheritance, if any.
    pub parent: Option<EntityId>,
    /// Attribute definitions declared directly on this entity.
    pub attributes: Vec<AttributeDef>,
    /// Relationship definitions declared on this entity.
    pub relationships: Vec<RelationshipDef>,
}

impl EntityDesc {
    /// Create a new entity description.
    ///
    /// The id defaults to deriving from the name. An entity that may be
    /// renamed across versions should pin its identity with
    /// [`with_identity`](Self::with_identity) instead.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: EntityId::derive(&name),
            name,
            parent: None,
            attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Pin the entity's identity to a stable key independent of its name.
    pub fn with_identity(mut self, identity: &str) -> Self {
        self.id = EntityId::derive(identity);
        self
    }

    /// Set the parent entity.
    pub fn with_parent(mut self, parent: EntityId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, attribute: AttributeDef) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add a relationship.
    pub fn with_relationship(mut self, relationship: RelationshipDef) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Get an attribute declared directly on this entity.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Get a relationship by name.
    pub fn relationship(&self, name: &str) -> Option<&RelationshipDef> {
        self.relationships.iter().find(|r| r.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttributeType, ScalarType};

    #[test]
    fn test_entity_builder() {
        let entity = EntityDesc::new("Person")
            .with_attribute(AttributeDef::new(
                "name",
                AttributeType::scalar(ScalarType::String),
            ))
            .with_attribute(AttributeDef::new(
                "age",
                AttributeType::scalar(ScalarType::Int32),
            ));

        assert_eq!(entity.name, "Person");
        assert_eq!(entity.id, EntityId::derive("Person"));
        assert_eq!(entity.attributes.len(), 2);
        assert!(entity.attribute("age").is_some());
        assert!(entity.attribute("nonexistent").is_none());
    }

    #[test]
    fn test_identity_survives_rename() {
        let v1 = EntityDesc::new("Person").with_identity("person");
        let v2 = EntityDesc::new("Human").with_identity("person");

        assert_eq!(v1.id, v2.id);
        assert_ne!(v1.name, v2.name);
    }

    #[test]
    fn test_relationship_lookup() {
        let pet = EntityId::derive("pet");
        let entity = EntityDesc::new("Person")
            .with_relationship(RelationshipDef::to_many("pets", pet));

        assert!(entity.relationship("pets").is_some());
        assert!(entity.relationship("cars").is_none());
    }
}
