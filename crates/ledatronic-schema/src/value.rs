use std::fmt;

use bytes::Bytes;
use serde::{Serialize, Serializer};

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Int(u64),
    Text(String),
    Bool(bool),
    /// Undecoded bytes, kept when a field's type cannot be applied.
    Raw(Bytes),
}

impl FieldValue {
    /// Falsy values are zero, empty text, `false` and empty raw bytes.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Int(n) => *n != 0,
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Bool(b) => *b,
            FieldValue::Raw(bytes) => !bytes.is_empty(),
        }
    }

    pub fn as_int(&self) -> Option<u64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(n) => write!(f, "{n}"),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Raw(bytes) => write!(f, "0x{}", hex::encode(bytes)),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Int(n) => serializer.serialize_u64(*n),
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Raw(bytes) => serializer.serialize_str(&hex::encode(bytes)),
        }
    }
}
