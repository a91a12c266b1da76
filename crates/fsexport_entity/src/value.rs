//! Typed field values.

use crate::key::EntityKey;
use std::collections::BTreeMap;

/// A mapping from field name to typed value.
///
/// `BTreeMap` keeps field order deterministic across runs, which keeps
/// serialized output stable.
pub type FieldMap = BTreeMap<String, Value>;

/// A field value.
///
/// This is the closed set of types an export entity field can carry.
/// Anything outside it is rejected while decoding, per record, so the
/// tree builder and the serializer can match exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Double-precision float.
    Float(f64),
    /// Text string (UTF-8).
    Text(String),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Timestamp in microseconds since the Unix epoch.
    Timestamp(i64),
    /// Geographic point.
    GeoPoint {
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        lng: f64,
    },
    /// Reference to another entity by key.
    Reference(EntityKey),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// Embedded sub-entity, already flattened to a plain field map.
    Entity(FieldMap),
}

impl Value {
    /// Name of this value's type, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Timestamp(_) => "timestamp",
            Self::GeoPoint { .. } => "geo_point",
            Self::Reference(_) => "reference",
            Self::Array(_) => "array",
            Self::Entity(_) => "entity",
        }
    }

    /// Check if this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get this value as an integer, if it is one.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a string, if it is a text string.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as an embedded entity map, if it is one.
    #[must_use]
    pub fn as_entity(&self) -> Option<&FieldMap> {
        match self {
            Self::Entity(m) => Some(m),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<FieldMap> for Value {
    fn from(m: FieldMap) -> Self {
        Self::Entity(m)
    }
}
