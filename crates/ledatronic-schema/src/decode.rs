use bytes::Bytes;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::error::FieldDecodeError;
use crate::field::{FieldDef, FieldKind};
use crate::schema::Schema;
use crate::value::FieldValue;

/// Name of the derived activity flag added to every snapshot.
pub const ACTIVE_FIELD: &str = "active";

/// Field the activity flag is derived from.
pub const ACTIVE_SOURCE_FIELD: &str = "current_combustion_temp";

/// The oven counts as active strictly above this combustion temperature.
pub const ACTIVE_THRESHOLD: u64 = 30;

/// All values decoded from one payload.
///
/// Entries keep schema order. A field that failed to decode is present
/// with a `None` value and a matching entry in [`Snapshot::errors`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    fields: Vec<(String, Option<FieldValue>)>,
    errors: Vec<FieldDecodeError>,
    active: bool,
}

impl Snapshot {
    /// Decoded value of a field; `None` if absent or unknown.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .and_then(|(_, value)| value.as_ref())
    }

    /// True if the snapshot has an entry for `name`, decoded or not.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(field, _)| field == name)
    }

    /// Entries in schema order, followed by the activity flag.
    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&FieldValue>)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    pub fn errors(&self) -> &[FieldDecodeError] {
        &self.errors
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Decode one payload against a schema.
///
/// Pure: the same payload and schema always produce the same snapshot.
/// Field failures are collected and never abort the remaining fields.
pub fn decode(payload: &[u8], schema: &Schema) -> Snapshot {
    let mut fields = Vec::with_capacity(schema.len() + 1);
    let mut errors = Vec::new();

    for field in schema {
        let (value, error) = decode_field(field, payload);
        if let Some(error) = error {
            debug!(field = %field.name, %error, "field decode error");
            errors.push(error);
        }
        fields.push((field.name.clone(), value));
    }

    let active = matches!(
        lookup(&fields, ACTIVE_SOURCE_FIELD),
        Some(FieldValue::Int(temp)) if *temp > ACTIVE_THRESHOLD
    );
    let active_value = Some(FieldValue::Bool(active));
    match fields.iter_mut().find(|(name, _)| name == ACTIVE_FIELD) {
        Some(entry) => entry.1 = active_value,
        None => fields.push((ACTIVE_FIELD.to_string(), active_value)),
    }

    debug!(
        fields = fields.len(),
        errors = errors.len(),
        active,
        "decoded payload"
    );

    Snapshot {
        fields,
        errors,
        active,
    }
}

fn lookup<'a>(fields: &'a [(String, Option<FieldValue>)], name: &str) -> Option<&'a FieldValue> {
    fields
        .iter()
        .find(|(field, _)| field == name)
        .and_then(|(_, value)| value.as_ref())
}

fn decode_field(
    field: &FieldDef,
    payload: &[u8],
) -> (Option<FieldValue>, Option<FieldDecodeError>) {
    let end = field.end();
    if end > payload.len() {
        return (
            None,
            Some(FieldDecodeError::InsufficientData {
                label: field.label.clone(),
                expected: end,
                actual: payload.len(),
            }),
        );
    }

    let raw = &payload[field.offset..end];
    let interpret_error = |reason: String| FieldDecodeError::Interpret {
        label: field.label.clone(),
        offset: field.offset,
        length: field.length,
        reason,
        raw_hex: hex::encode(raw),
    };

    match &field.kind {
        FieldKind::Int { byte_order } => match byte_order.read_uint(raw) {
            Some(n) => (Some(FieldValue::Int(n)), None),
            None => (
                None,
                Some(interpret_error(format!(
                    "{} byte integer does not fit in 64 bits",
                    raw.len()
                ))),
            ),
        },
        FieldKind::Float => (
            None,
            Some(FieldDecodeError::FloatNotImplemented {
                label: field.label.clone(),
            }),
        ),
        FieldKind::Text { encoding } => match encoding.decode(raw) {
            Ok(text) => (
                Some(FieldValue::Text(text.trim_end_matches('\0').to_string())),
                None,
            ),
            Err(reason) => (None, Some(interpret_error(reason))),
        },
        FieldKind::Mapped { map: Some(map) } if field.length == 1 => {
            (Some(FieldValue::Text(map.lookup(u64::from(raw[0])))), None)
        }
        FieldKind::Mapped { .. } => (
            Some(FieldValue::Raw(Bytes::copy_from_slice(raw))),
            Some(FieldDecodeError::InvalidMapped {
                label: field.label.clone(),
                raw_hex: hex::encode(raw),
            }),
        ),
        // Presence of the byte range, not its content.
        FieldKind::Bool => (Some(FieldValue::Bool(!raw.is_empty())), None),
        FieldKind::Unsupported(type_name) => (
            Some(FieldValue::Raw(Bytes::copy_from_slice(raw))),
            Some(FieldDecodeError::UnsupportedType {
                type_name: type_name.clone(),
                label: field.label.clone(),
            }),
        ),
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Snapshot", 3)?;
        state.serialize_field("fields", &FieldsView(&self.fields))?;
        state.serialize_field("active", &self.active)?;
        state.serialize_field("errors", &self.error_messages())?;
        state.end()
    }
}

struct FieldsView<'a>(&'a [(String, Option<FieldValue>)]);

impl Serialize for FieldsView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
