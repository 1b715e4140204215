use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::SchemaError;

/// Byte order of a multi-byte integer field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    Big,
    #[default]
    Little,
}

impl ByteOrder {
    /// Interpret up to eight bytes as an unsigned integer.
    pub fn read_uint(self, bytes: &[u8]) -> Option<u64> {
        if bytes.len() > 8 {
            return None;
        }
        let fold = |acc: u64, b: &u8| (acc << 8) | u64::from(*b);
        Some(match self {
            ByteOrder::Big => bytes.iter().fold(0, fold),
            ByteOrder::Little => bytes.iter().rev().fold(0, fold),
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ByteOrder::Big => "big",
            ByteOrder::Little => "little",
        }
    }
}

/// Text encoding of a string field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Latin1,
    Ascii,
    /// Accepted when loading, rejected per field when decoding.
    Other(String),
}

impl TextEncoding {
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => TextEncoding::Utf8,
            "latin-1" | "latin1" | "iso-8859-1" => TextEncoding::Latin1,
            "ascii" | "us-ascii" => TextEncoding::Ascii,
            _ => TextEncoding::Other(name.to_string()),
        }
    }

    /// Decode bytes to text, or return a reason for the failure.
    pub fn decode(&self, bytes: &[u8]) -> std::result::Result<String, String> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_string)
                .map_err(|err| format!("invalid utf-8: {err}")),
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            TextEncoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(format!(
                    "byte 0x{:02x} in position {pos} is not ascii",
                    bytes[pos]
                )),
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
            TextEncoding::Other(name) => Err(format!("unknown encoding: {name}")),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Other(name) => name,
        }
    }
}

/// Integer code to label lookup for mapped fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueMap {
    entries: BTreeMap<u64, String>,
}

impl ValueMap {
    pub fn from_pairs(pairs: &[(u8, &str)]) -> Self {
        Self {
            entries: pairs
                .iter()
                .map(|&(code, label)| (u64::from(code), label.to_string()))
                .collect(),
        }
    }

    pub fn get(&self, code: u64) -> Option<&str> {
        self.entries.get(&code).map(String::as_str)
    }

    /// Label for `code`, or `"Unknown value: {code}"`.
    pub fn lookup(&self, code: u64) -> String {
        match self.get(code) {
            Some(label) => label.to_string(),
            None => format!("Unknown value: {code}"),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &str)> {
        self.entries.iter().map(|(code, label)| (*code, label.as_str()))
    }
}

impl FromIterator<(u64, String)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (u64, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// How a field's bytes are interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Unsigned integer.
    Int { byte_order: ByteOrder },
    /// Declared by some schemas; decoding always reports an error.
    Float,
    /// Text with trailing NULs removed.
    Text { encoding: TextEncoding },
    /// Single byte looked up in a value map.
    Mapped { map: Option<ValueMap> },
    /// True whenever the field's byte range is non-empty.
    Bool,
    /// Any other declared type name.
    Unsupported(String),
}

impl FieldKind {
    /// Type name as written in schema files.
    pub fn type_name(&self) -> &str {
        match self {
            FieldKind::Int { .. } => "int",
            FieldKind::Float => "float",
            FieldKind::Text { .. } => "string",
            FieldKind::Mapped { .. } => "mapped",
            FieldKind::Bool => "bool",
            FieldKind::Unsupported(name) => name,
        }
    }
}

/// One named field of a payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawFieldDef")]
pub struct FieldDef {
    pub name: String,
    pub offset: usize,
    pub length: usize,
    pub kind: FieldKind,
    pub label: String,
    pub unit: Option<String>,
}

impl FieldDef {
    pub fn new(name: &str, offset: usize, length: usize, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            offset,
            length,
            kind,
            label: name.to_string(),
            unit: None,
        }
    }

    pub fn int(name: &str, offset: usize, length: usize, byte_order: ByteOrder) -> Self {
        Self::new(name, offset, length, FieldKind::Int { byte_order })
    }

    pub fn mapped(name: &str, offset: usize, map: &ValueMap) -> Self {
        Self::new(
            name,
            offset,
            1,
            FieldKind::Mapped {
                map: Some(map.clone()),
            },
        )
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    /// Exclusive end offset within the payload.
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.length)
    }
}

/// Schema-file shape of a field, mirroring the controller documentation.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFieldDef {
    name: String,
    offset: usize,
    length: usize,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    byteorder: Option<ByteOrder>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    map: Option<BTreeMap<String, String>>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    unit: Option<String>,
}

impl TryFrom<RawFieldDef> for FieldDef {
    type Error = SchemaError;

    fn try_from(raw: RawFieldDef) -> std::result::Result<Self, Self::Error> {
        if raw.name.trim().is_empty() {
            return Err(SchemaError::InvalidField {
                name: raw.name,
                reason: "name must not be empty".to_string(),
            });
        }

        let kind = match raw.kind.as_str() {
            "int" => FieldKind::Int {
                byte_order: raw.byteorder.unwrap_or_default(),
            },
            "float" => FieldKind::Float,
            "string" => FieldKind::Text {
                encoding: raw
                    .encoding
                    .as_deref()
                    .map(TextEncoding::parse)
                    .unwrap_or_default(),
            },
            "mapped" => FieldKind::Mapped {
                map: raw.map.map(|m| parse_map(&raw.name, m)).transpose()?,
            },
            "bool" => FieldKind::Bool,
            other => FieldKind::Unsupported(other.to_string()),
        };

        Ok(FieldDef {
            label: raw.label.unwrap_or_else(|| raw.name.clone()),
            name: raw.name,
            offset: raw.offset,
            length: raw.length,
            kind,
            unit: raw.unit,
        })
    }
}

fn parse_map(name: &str, map: BTreeMap<String, String>) -> std::result::Result<ValueMap, SchemaError> {
    map.into_iter()
        .map(|(key, label)| {
            key.trim()
                .parse::<u64>()
                .map(|code| (code, label))
                .map_err(|_| SchemaError::InvalidField {
                    name: name.to_string(),
                    reason: format!("map key '{key}' is not an unsigned integer"),
                })
        })
        .collect()
}
