//! Core type definitions for the schema model.

use rkyv::{Archive, Deserialize, Serialize};

/// Scalar data types an attribute can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum ScalarType {
    /// Boolean value.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    String,
    /// Binary data.
    Bytes,
    /// Timestamp (microseconds since Unix epoch).
    Timestamp,
    /// UUID (128-bit identifier).
    Uuid,
}

/// Attribute types - flat representation without recursion.
///
/// Note: Nested optional/array types are not supported to avoid recursive
/// type issues with rkyv serialization.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum AttributeType {
    /// A scalar value.
    Scalar(ScalarType),
    /// An optional scalar value (nullable).
    OptionalScalar(ScalarType),
    /// An array of scalar values.
    ArrayScalar(ScalarType),
}

/// Cardinality of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum Cardinality {
    /// Exactly one target on each side.
    OneToOne,
    /// One source, many targets.
    OneToMany,
    /// Many sources, one target.
    ManyToOne,
    /// Many on both sides.
    ManyToMany,
}

/// Behavior when a relationship target is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum DeleteRule {
    /// Delete related instances.
    Cascade,
    /// Prevent deletion while related instances exist.
    Restrict,
    /// Clear the reference.
    SetNull,
}

impl AttributeType {
    /// Create a scalar attribute type.
    pub fn scalar(scalar: ScalarType) -> Self {
        AttributeType::Scalar(scalar)
    }

    /// Create an optional scalar attribute type.
    pub fn optional_scalar(scalar: ScalarType) -> Self {
        AttributeType::OptionalScalar(scalar)
    }

    /// Create an array-of-scalars attribute type.
    pub fn array_scalar(scalar: ScalarType) -> Self {
        AttributeType::ArrayScalar(scalar)
    }

    /// Check if this type is nullable.
    pub fn is_nullable(&self) -> bool {
        matches!(self, AttributeType::OptionalScalar(_))
    }

    /// Check if this type is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, AttributeType::ArrayScalar(_))
    }

    /// Get the inner scalar type.
    pub fn scalar_type(&self) -> &ScalarType {
        match self {
            AttributeType::Scalar(s)
            | AttributeType::OptionalScalar(s)
            | AttributeType::ArrayScalar(s) => s,
        }
    }
}

impl Cardinality {
    /// Check whether the destination side holds multiple targets.
    pub fn is_to_many(&self) -> bool {
        matches!(self, Cardinality::OneToMany | Cardinality::ManyToMany)
    }
}
