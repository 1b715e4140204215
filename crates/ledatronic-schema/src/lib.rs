//! Table-driven decoder for LEDATRONIC status payloads.
//!
//! A [`Schema`] lists named fields by offset, length and type. [`decode`]
//! walks the schema over one payload and returns a [`Snapshot`]: every field
//! decoded independently, failures collected instead of raised.

pub mod decode;
pub mod error;
pub mod field;
pub mod schema;
pub mod tables;
pub mod value;

pub use decode::{decode, Snapshot, ACTIVE_FIELD, ACTIVE_SOURCE_FIELD, ACTIVE_THRESHOLD};
pub use error::{FieldDecodeError, Result, SchemaError};
pub use field::{ByteOrder, FieldDef, FieldKind, TextEncoding, ValueMap};
pub use schema::Schema;
pub use tables::{OVEN_STATES, VENT_STATES};
pub use value::FieldValue;
