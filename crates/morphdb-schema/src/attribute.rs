//! Attribute definitions for entities.

use crate::types::AttributeType;
use rkyv::{Archive, Deserialize, Serialize};

/// Storage and matching traits of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum AttributeTrait {
    /// Maintained in a secondary index.
    Indexed,
    /// Computed at runtime, never persisted. Transient attributes carry no
    /// stored value and are skipped when migration copies records.
    Transient,
    /// Value must be unique across the entity's instances.
    Unique,
}

/// An attribute definition within an entity.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct AttributeDef {
    /// Attribute name (unique within the entity).
    pub name: String,
    /// Attribute data type.
    pub ty: AttributeType,
    /// Storage and matching traits.
    pub traits: Vec<AttributeTrait>,
    /// Stable identity for cross-version matching.
    ///
    /// When an attribute is renamed between schema versions, both versions
    /// declare the same renaming identifier so that migration recognizes them
    /// as the same attribute. Unset means the attribute's own name is its
    /// identity.
    pub renaming_identifier: Option<String>,
}

impl AttributeDef {
    /// Create a new attribute.
    pub fn new(name: impl Into<String>, ty: AttributeType) -> Self {
        Self {
            name: name.into(),
            ty,
            traits: Vec::new(),
            renaming_identifier: None,
        }
    }

    /// Set the renaming identifier.
    pub fn with_renaming_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.renaming_identifier = Some(identifier.into());
        self
    }

    /// Add a trait.
    pub fn with_trait(mut self, t: AttributeTrait) -> Self {
        self.traits.push(t);
        self
    }

    /// The identity used to match this attribute across schema versions.
    pub fn renaming_id(&self) -> &str {
        self.renaming_identifier.as_deref().unwrap_or(&self.name)
    }

    /// Check if this attribute carries a trait.
    pub fn has_trait(&self, t: AttributeTrait) -> bool {
        self.traits.contains(&t)
    }

    /// Check if this attribute is transient (never persisted).
    pub fn is_transient(&self) -> bool {
        self.has_trait(AttributeTrait::Transient)
    }
}
