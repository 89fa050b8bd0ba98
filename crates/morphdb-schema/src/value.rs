//! Runtime values stored in record attributes.

use rkyv::{Archive, Deserialize, Serialize};

/// A runtime value held by a record attribute.
///
/// This enum covers every value a store can persist for an attribute. It maps
/// one-to-one onto the scalar types of the schema model.
///
/// Note: Arrays are typed (e.g., Int64Array, StringArray) to avoid recursive
/// type issues with rkyv serialization.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub enum FieldValue {
    /// Null value (also what reading an absent attribute yields).
    Null,
    /// Boolean value.
    Bool(bool),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 32-bit floating point.
    Float32(f32),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Timestamp as microseconds since Unix epoch.
    Timestamp(i64),
    /// UUID as 16 bytes.
    Uuid([u8; 16]),
    /// Array of 64-bit integers.
    Int64Array(Vec<i64>),
    /// Array of strings.
    StringArray(Vec<String>),
}

impl FieldValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i32.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            FieldValue::Int32(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as i64, widening Int32.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int64(i) => Some(*i),
            FieldValue::Int32(i) => Some(*i as i64),
            _ => None,
        }
    }

    /// Try to get as f64, widening Float32.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float64(f) => Some(*f),
            FieldValue::Float32(f) => Some(*f as f64),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as bytes reference.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get as timestamp.
    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            FieldValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Try to get as UUID.
    pub fn as_uuid(&self) -> Option<&[u8; 16]> {
        match self {
            FieldValue::Uuid(u) => Some(u),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int32(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int64(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float32(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float64(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        FieldValue::Bytes(v)
    }
}

impl From<[u8; 16]> for FieldValue {
    fn from(v: [u8; 16]) -> Self {
        FieldValue::Uuid(v)
    }
}

impl From<Vec<i64>> for FieldValue {
    fn from(v: Vec<i64>) -> Self {
        FieldValue::Int64Array(v)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::StringArray(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => FieldValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        assert!(FieldValue::Null.is_null());
        assert!(!FieldValue::Bool(true).is_null());

        assert_eq!(FieldValue::Bool(true).as_bool(), Some(true));
        assert_eq!(FieldValue::Int32(42).as_i32(), Some(42));
        assert_eq!(FieldValue::Int64(100).as_i64(), Some(100));
        assert_eq!(FieldValue::Int32(42).as_i64(), Some(42)); // Widening conversion

        assert_eq!(FieldValue::String("hello".into()).as_str(), Some("hello"));
        assert_eq!(
            FieldValue::Bytes(vec![1, 2, 3]).as_bytes(),
            Some(&[1, 2, 3][..])
        );
    }

    #[test]
    fn test_value_conversions() {
        let v: FieldValue = true.into();
        assert_eq!(v, FieldValue::Bool(true));

        let v: FieldValue = "hello".into();
        assert_eq!(v, FieldValue::String("hello".into()));

        let v: FieldValue = None::<i32>.into();
        assert_eq!(v, FieldValue::Null);

        let v: FieldValue = Some(42i32).into();
        assert_eq!(v, FieldValue::Int32(42));
    }

    #[test]
    fn test_value_serialization_roundtrip() {
        let values = vec![
            FieldValue::Null,
            FieldValue::Bool(true),
            FieldValue::Int32(-42),
            FieldValue::Int64(i64::MAX),
            FieldValue::Float64(std::f64::consts::PI),
            FieldValue::String("hello world".into()),
            FieldValue::Bytes(vec![0, 1, 2, 255]),
            FieldValue::Timestamp(1704067200_000_000),
            FieldValue::Uuid([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]),
            FieldValue::Int64Array(vec![1, 2, 3]),
            FieldValue::StringArray(vec!["a".into(), "b".into()]),
        ];

        for value in values {
            let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&value).unwrap();
            let deserialized: FieldValue =
                rkyv::from_bytes::<FieldValue, rkyv::rancor::Error>(&bytes).unwrap();
            assert_eq!(value, deserialized);
        }
    }
}
