//! Mapping operations - the vocabulary migration plans are written in.

use super::context::TransformContext;
use super::error::TransformError;
use morphdb_schema::{EntityId, SchemaSnapshot};
use std::fmt;
use std::sync::Arc;

/// Per-record migration logic for one entity.
///
/// The engine calls `transform` once per source instance with a fresh
/// [`TransformContext`]. A transformer that never touches
/// [`create_destination`](TransformContext::create_destination) (directly or
/// through a write) filters that record out of the destination store.
pub trait RecordTransformer: Send + Sync {
    /// Migrate one source record through the context.
    fn transform(&self, ctx: &mut TransformContext<'_>) -> Result<(), TransformError>;
}

impl<F> RecordTransformer for F
where
    F: Fn(&mut TransformContext<'_>) -> Result<(), TransformError> + Send + Sync,
{
    fn transform(&self, ctx: &mut TransformContext<'_>) -> Result<(), TransformError> {
        self(ctx)
    }
}

/// A source attribute paired with the destination attribute it feeds.
///
/// Pairings are matched by renaming identifier, so a renamed attribute still
/// pairs with its old self.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePairing {
    /// Attribute name on the source entity.
    pub source: String,
    /// Attribute name on the destination entity.
    pub destination: String,
}

impl AttributePairing {
    /// Pair up the attributes two entity versions share.
    ///
    /// Matching walks the destination entity's effective attributes (parent
    /// chain included) and pairs each with the source attribute carrying the
    /// same renaming identifier. Attributes present on only one side are
    /// ignored; transient attributes on either side never pair, since they
    /// hold no stored value.
    pub fn matched(
        source: &SchemaSnapshot,
        destination: &SchemaSnapshot,
        source_entity: EntityId,
        destination_entity: EntityId,
    ) -> Vec<AttributePairing> {
        let source_attrs = source.effective_attributes(source_entity);
        let mut pairings = Vec::new();

        for dest_attr in destination.effective_attributes(destination_entity) {
            if dest_attr.is_transient() {
                continue;
            }
            let matched = source_attrs
                .iter()
                .find(|a| a.renaming_id() == dest_attr.renaming_id());
            if let Some(src_attr) = matched {
                if src_attr.is_transient() {
                    continue;
                }
                pairings.push(AttributePairing {
                    source: src_attr.name.clone(),
                    destination: dest_attr.name.clone(),
                });
            }
        }

        pairings
    }
}

/// The inferred transformer: create the destination record and copy every
/// paired attribute verbatim.
#[derive(Debug, Clone)]
pub struct IdentityTransformer {
    pairings: Vec<AttributePairing>,
}

impl IdentityTransformer {
    /// Build an identity transformer over precomputed pairings.
    pub fn new(pairings: Vec<AttributePairing>) -> Self {
        Self { pairings }
    }

    /// The attribute pairings this transformer copies.
    pub fn pairings(&self) -> &[AttributePairing] {
        &self.pairings
    }
}

impl RecordTransformer for IdentityTransformer {
    fn transform(&self, ctx: &mut TransformContext<'_>) -> Result<(), TransformError> {
        // Create unconditionally: a record with no paired attributes still
        // survives migration.
        ctx.create_destination()?;
        for pairing in &self.pairings {
            let value = ctx.read_source(&pairing.source)?;
            // Absent and Null read the same, so skipping nulls keeps
            // destination records sparse without changing what reads see.
            if !value.is_null() {
                ctx.write_destination(&pairing.destination, value)?;
            }
        }
        Ok(())
    }
}

/// One entity-level step of a migration plan.
///
/// Every entity of the source snapshot appears as the `source` of exactly one
/// operation, and every entity of the destination snapshot as the
/// `destination` of exactly one operation. The four variants are the complete
/// vocabulary; the engine matches on them exhaustively.
#[derive(Clone)]
pub enum MappingOperation {
    /// The entity exists only in the source; its records are not carried over.
    Delete {
        /// The entity being dropped.
        source: EntityId,
    },
    /// The entity exists only in the destination; it starts with no records.
    Insert {
        /// The entity being introduced.
        destination: EntityId,
    },
    /// Records are copied verbatim, attribute by paired attribute.
    Copy {
        /// The entity read from.
        source: EntityId,
        /// The entity written to.
        destination: EntityId,
    },
    /// Records pass through a custom transformer.
    Transform {
        /// The entity read from.
        source: EntityId,
        /// The entity written to.
        destination: EntityId,
        /// The per-record logic.
        transformer: Arc<dyn RecordTransformer>,
    },
}

/// The kind of a mapping operation, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Entity dropped.
    Delete,
    /// Entity introduced empty.
    Insert,
    /// Records copied verbatim.
    Copy,
    /// Records transformed.
    Transform,
}

impl OperationKind {
    /// Every kind, in the order plans iterate them.
    pub const ALL: [OperationKind; 4] = [
        OperationKind::Delete,
        OperationKind::Insert,
        OperationKind::Copy,
        OperationKind::Transform,
    ];
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Delete => write!(f, "delete"),
            OperationKind::Insert => write!(f, "insert"),
            OperationKind::Copy => write!(f, "copy"),
            OperationKind::Transform => write!(f, "transform"),
        }
    }
}

impl MappingOperation {
    /// Drop an entity and all its records.
    pub fn delete(source: EntityId) -> Self {
        MappingOperation::Delete { source }
    }

    /// Introduce an entity with no records.
    pub fn insert(destination: EntityId) -> Self {
        MappingOperation::Insert { destination }
    }

    /// Copy an entity's records verbatim.
    pub fn copy(source: EntityId, destination: EntityId) -> Self {
        MappingOperation::Copy {
            source,
            destination,
        }
    }

    /// Migrate an entity's records through a custom transformer.
    pub fn transform(
        source: EntityId,
        destination: EntityId,
        transformer: impl RecordTransformer + 'static,
    ) -> Self {
        MappingOperation::Transform {
            source,
            destination,
            transformer: Arc::new(transformer),
        }
    }

    /// This operation's kind.
    pub fn kind(&self) -> OperationKind {
        match self {
            MappingOperation::Delete { .. } => OperationKind::Delete,
            MappingOperation::Insert { .. } => OperationKind::Insert,
            MappingOperation::Copy { .. } => OperationKind::Copy,
            MappingOperation::Transform { .. } => OperationKind::Transform,
        }
    }

    /// The source entity this operation consumes, if any.
    pub fn source(&self) -> Option<EntityId> {
        match self {
            MappingOperation::Delete { source } => Some(*source),
            MappingOperation::Insert { .. } => None,
            MappingOperation::Copy { source, .. } => Some(*source),
            MappingOperation::Transform { source, .. } => Some(*source),
        }
    }

    /// The destination entity this operation produces, if any.
    pub fn destination(&self) -> Option<EntityId> {
        match self {
            MappingOperation::Delete { .. } => None,
            MappingOperation::Insert { destination } => Some(*destination),
            MappingOperation::Copy { destination, .. } => Some(*destination),
            MappingOperation::Transform { destination, .. } => Some(*destination),
        }
    }
}

impl fmt::Debug for MappingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingOperation::Delete { source } => {
                f.debug_struct("Delete").field("source", source).finish()
            }
            MappingOperation::Insert { destination } => f
                .debug_struct("Insert")
                .field("destination", destination)
                .finish(),
            MappingOperation::Copy {
                source,
                destination,
            } => f
                .debug_struct("Copy")
                .field("source", source)
                .field("destination", destination)
                .finish(),
            MappingOperation::Transform {
                source,
                destination,
                ..
            } => f
                .debug_struct("Transform")
                .field("source", source)
                .field("destination", destination)
                .finish_non_exhaustive(),
        }
    }
}
