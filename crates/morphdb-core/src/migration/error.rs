//! Migration-specific error types.

use crate::error::StoreError;
use morphdb_schema::{EntityId, InstanceId, SchemaError};
use thiserror::Error;

/// Errors raised while resolving two snapshots into a mapping plan.
#[derive(Debug, Error)]
pub enum MappingError {
    /// Two operations claim the same entity on the same side.
    #[error("conflicting claim on {entity}: {first} vs {second}")]
    ConflictingClaim {
        /// The doubly-claimed entity.
        entity: EntityId,
        /// How the entity was claimed first.
        first: String,
        /// The claim that collided with it.
        second: String,
    },

    /// The resolved operations do not cover both snapshots exactly once.
    #[error("incomplete mapping: {detail}")]
    IncompleteMapping {
        /// Which entity is missing or doubly covered, and on which side.
        detail: String,
    },

    /// A snapshot failed validation before resolution started.
    #[error("invalid snapshot: {0}")]
    Schema(#[from] SchemaError),
}

/// Errors raised by a record transformer.
///
/// Store failures convert automatically; anything else a transformer wants
/// to signal goes through [`TransformError::custom`].
#[derive(Debug, Error)]
pub enum TransformError {
    /// A store operation failed inside the transformer.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Transformer-specific failure.
    #[error("{0}")]
    Custom(String),
}

impl TransformError {
    /// Create a transformer-specific error from a message.
    pub fn custom(message: impl Into<String>) -> Self {
        TransformError::Custom(message.into())
    }
}

/// Errors raised while executing a migration plan.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A record transformer failed; the run stops and the error is
    /// propagated unchanged inside this variant.
    #[error("transformer failed for {entity} instance {instance}: {source}")]
    Transformer {
        /// The entity whose operation was running.
        entity: EntityId,
        /// The source instance being transformed.
        instance: InstanceId,
        /// The transformer's own error.
        source: TransformError,
    },

    /// The association table lacks an entry the plan implies must exist.
    #[error(
        "integrity violation: {entity} instance {instance} relationship \
         {relationship:?} targets unmapped instance {target}"
    )]
    Integrity {
        /// The entity whose relationships were being rebuilt.
        entity: EntityId,
        /// The destination instance being written.
        instance: InstanceId,
        /// The relationship being rebuilt.
        relationship: String,
        /// The source target with no association entry.
        target: InstanceId,
    },

    /// A to-one relationship ended up with more than one mapped target.
    #[error(
        "cardinality overflow: {entity} relationship {relationship:?} is \
         to-one but {targets} targets survived migration"
    )]
    CardinalityOverflow {
        /// The entity declaring the relationship.
        entity: EntityId,
        /// The relationship name.
        relationship: String,
        /// How many targets survived.
        targets: usize,
    },

    /// A source instance was associated twice.
    #[error("instance {instance} of {entity} was migrated twice")]
    DuplicateAssociation {
        /// The entity being migrated.
        entity: EntityId,
        /// The doubly-recorded source instance.
        instance: InstanceId,
    },

    /// A store operation failed outside any transformer.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
