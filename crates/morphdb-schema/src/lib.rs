//! MorphDB schema model - entity descriptions and runtime values.
//!
//! This crate defines the vocabulary the rest of MorphDB speaks: stable
//! entity and instance identifiers, attribute and relationship definitions,
//! versioned schema snapshots, and the runtime values record stores hold.
//!
//! # Modules
//!
//! - [`identity`] - Stable `EntityId` and per-store `InstanceId` handles
//! - [`types`] - Scalar types, attribute types, cardinality, delete rules
//! - [`attribute`] - Attribute definitions with renaming identifiers
//! - [`relationship`] - Directional relationship definitions
//! - [`entity`] - Entity descriptions
//! - [`snapshot`] - Versioned schema snapshots with validation
//! - [`value`] - Runtime values stored in record attributes
//!
//! # Serialization
//!
//! All persistent types in this crate derive `rkyv::Archive`,
//! `rkyv::Serialize`, and `rkyv::Deserialize`, so snapshots and values can be
//! stored and reloaded without a separate interchange format.

pub mod attribute;
pub mod entity;
pub mod error;
pub mod identity;
pub mod relationship;
pub mod snapshot;
pub mod types;
pub mod value;

pub use attribute::{AttributeDef, AttributeTrait};
pub use entity::EntityDesc;
pub use error::SchemaError;
pub use identity::{EntityId, InstanceId};
pub use relationship::RelationshipDef;
pub use snapshot::SchemaSnapshot;
pub use types::{AttributeType, Cardinality, DeleteRule, ScalarType};
pub use value::FieldValue;
