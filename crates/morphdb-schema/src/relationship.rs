//! Relationship definitions between entities.

use crate::identity::EntityId;
use crate::types::{Cardinality, DeleteRule};
use rkyv::{Archive, Deserialize, Serialize};

/// A relationship declared on an entity, pointing at a destination entity.
///
/// Relationships are directional. A bidirectional pair is modeled as two
/// declarations that name each other through `inverse_name`; a relationship
/// without an inverse is unidirectional, which is permitted.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct RelationshipDef {
    /// Relationship name (unique within the declaring entity).
    pub name: String,
    /// The entity instances of this relationship point at.
    pub destination: EntityId,
    /// Name of the inverse relationship on the destination entity, if any.
    pub inverse_name: Option<String>,
    /// Relationship cardinality.
    pub cardinality: Cardinality,
    /// Whether target order is significant and must be preserved.
    pub ordered: bool,
    /// Behavior when a target instance is deleted.
    pub delete_rule: DeleteRule,
}

impl RelationshipDef {
    /// Create a to-one relationship.
    pub fn to_one(name: impl Into<String>, destination: EntityId) -> Self {
        Self {
            name: name.into(),
            destination,
            inverse_name: None,
            cardinality: Cardinality::ManyToOne,
            ordered: false,
            delete_rule: DeleteRule::Restrict,
        }
    }

    /// Create a to-many relationship.
    pub fn to_many(name: impl Into<String>, destination: EntityId) -> Self {
        Self {
            name: name.into(),
            destination,
            inverse_name: None,
            cardinality: Cardinality::OneToMany,
            ordered: false,
            delete_rule: DeleteRule::Restrict,
        }
    }

    /// Set the inverse relationship name.
    pub fn with_inverse(mut self, inverse: impl Into<String>) -> Self {
        self.inverse_name = Some(inverse.into());
        self
    }

    /// Override the cardinality.
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    /// Mark target order as significant.
    pub fn ordered(mut self) -> Self {
        self.ordered = true;
        self
    }

    /// Set the delete rule.
    pub fn with_delete_rule(mut self, rule: DeleteRule) -> Self {
        self.delete_rule = rule;
        self
    }

    /// Check whether this relationship holds multiple targets.
    pub fn is_to_many(&self) -> bool {
        self.cardinality.is_to_many()
    }
}
