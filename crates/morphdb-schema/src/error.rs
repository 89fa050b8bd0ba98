//! Schema validation errors.

use crate::identity::EntityId;
use thiserror::Error;

/// Errors raised when validating a schema snapshot.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Two entities in one snapshot share an id.
    #[error("duplicate entity id {id} (entities {first:?} and {second:?})")]
    DuplicateEntity {
        /// The shared id.
        id: EntityId,
        /// Name of the first entity carrying it.
        first: String,
        /// Name of the second entity carrying it.
        second: String,
    },

    /// An entity names a parent that is not in the snapshot.
    #[error("entity {entity:?} references unknown parent {parent}")]
    UnknownParent {
        /// The declaring entity's name.
        entity: String,
        /// The missing parent id.
        parent: EntityId,
    },

    /// The parent chain of an entity loops back on itself.
    #[error("entity {entity:?} participates in a parent cycle")]
    ParentCycle {
        /// An entity on the cycle.
        entity: String,
    },

    /// A relationship points at an entity that is not in the snapshot.
    #[error("relationship {entity:?}.{relationship:?} references unknown destination {destination}")]
    UnknownDestination {
        /// The declaring entity's name.
        entity: String,
        /// The relationship name.
        relationship: String,
        /// The missing destination id.
        destination: EntityId,
    },

    /// A declared inverse exists on the destination but points elsewhere.
    #[error(
        "relationship {entity:?}.{relationship:?} declares inverse {inverse:?}, \
         which does not point back at {entity:?}"
    )]
    AsymmetricInverse {
        /// The declaring entity's name.
        entity: String,
        /// The relationship name.
        relationship: String,
        /// The inverse relationship name on the destination entity.
        inverse: String,
    },

    /// Two attributes on one entity share a name.
    #[error("entity {entity:?} declares attribute {attribute:?} more than once")]
    DuplicateAttribute {
        /// The declaring entity's name.
        entity: String,
        /// The repeated attribute name.
        attribute: String,
    },

    /// Two relationships on one entity share a name.
    #[error("entity {entity:?} declares relationship {relationship:?} more than once")]
    DuplicateRelationship {
        /// The declaring entity's name.
        entity: String,
        /// The repeated relationship name.
        relationship: String,
    },

    /// Two persisted attributes visible on one entity answer to the same
    /// renaming identifier, so cross-version matching cannot tell them apart.
    #[error(
        "entity {entity:?} has attributes {first:?} and {second:?} sharing \
         renaming identifier {identifier:?}"
    )]
    DuplicateRenamingIdentifier {
        /// The declaring entity's name.
        entity: String,
        /// Name of the first attribute carrying it.
        first: String,
        /// Name of the second attribute carrying it.
        second: String,
        /// The shared identifier.
        identifier: String,
    },
}
