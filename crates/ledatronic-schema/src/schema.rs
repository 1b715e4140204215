use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::field::FieldDef;
use crate::tables::ledatronic_fields;

/// Maximum accepted size of a schema file.
const MAX_SCHEMA_FILE_SIZE: u64 = 256 * 1024;

/// Ordered set of field definitions.
///
/// Fields are independent: offsets may overlap, and each field is decoded
/// from its own byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldDef>,
}

impl Schema {
    /// Build a schema from field definitions, rejecting duplicate names.
    pub fn new(fields: Vec<FieldDef>) -> Result<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }
        Ok(Self { fields })
    }

    /// The status payload layout of LEDATRONIC controllers.
    pub fn ledatronic() -> Self {
        Self {
            fields: ledatronic_fields(),
        }
    }

    /// Parse a JSON array of field objects.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let fields: Vec<FieldDef> = serde_json::from_str(json)?;
        Self::new(fields)
    }

    /// Load a JSON schema file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;
        if metadata.len() > MAX_SCHEMA_FILE_SIZE {
            return Err(SchemaError::LoadFailed(format!(
                "{}: file size {} exceeds max {MAX_SCHEMA_FILE_SIZE}",
                path.display(),
                metadata.len()
            )));
        }

        let json = std::fs::read_to_string(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;
        let schema = Self::from_json_str(&json)?;
        debug!(path = %path.display(), fields = schema.len(), "loaded schema");
        Ok(schema)
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldDef> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Smallest payload length that satisfies every field.
    pub fn required_len(&self) -> usize {
        self.fields.iter().map(FieldDef::end).max().unwrap_or(0)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::ledatronic()
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a FieldDef;
    type IntoIter = std::slice::Iter<'a, FieldDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use ledatronic_frame::PAYLOAD_LEN;

    use super::*;
    use crate::field::{ByteOrder, FieldKind};

    #[test]
    fn ledatronic_schema_fits_payload() {
        let schema = Schema::ledatronic();
        assert_eq!(schema.len(), 28);
        assert!(schema.required_len() <= PAYLOAD_LEN);
    }

    #[test]
    fn ledatronic_schema_layout() {
        let schema = Schema::ledatronic();

        let temp = schema.get("current_combustion_temp").unwrap();
        assert_eq!((temp.offset, temp.length), (0, 2));
        assert_eq!(
            temp.kind,
            FieldKind::Int {
                byte_order: ByteOrder::Big
            }
        );
        assert_eq!(temp.unit.as_deref(), Some("°C"));

        let exhaust = schema.get("exhaust_temp").unwrap();
        assert_eq!((exhaust.offset, exhaust.length), (46, 2));

        assert_eq!(schema.get("lock_state").unwrap().kind, FieldKind::Bool);
        assert_eq!(
            schema.get("oven_state_raw").unwrap().offset,
            schema.get("oven_state_mapped").unwrap().offset
        );
        assert_eq!(
            schema.get("error_pressure").unwrap().offset,
            schema.get("fan_state").unwrap().offset
        );
        assert!(schema.get("active").is_none());

        let labels: Vec<_> = ["num_heating_errors", "water_pocket_temp", "tank_temp_bottom"]
            .iter()
            .map(|name| schema.get(name).unwrap().label.as_str())
            .collect();
        assert_eq!(
            labels,
            ["Anzahl Heizfehler (offset 15)", "WassertascheTemp in °C", "TankTempUnten in °C"]
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Schema::from_json_str(
            r#"[
                {"name":"a","offset":0,"length":1,"type":"int"},
                {"name":"a","offset":1,"length":1,"type":"int"}
            ]"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField(name) if name == "a"));
    }

    #[test]
    fn from_json_file_round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("ledatronic-schema-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("fields.json");
        std::fs::write(
            &path,
            r#"[{"name":"temp","offset":0,"length":2,"type":"int","byteorder":"big","unit":"°C"}]"#,
        )
        .unwrap();

        let schema = Schema::from_json_file(&path).unwrap();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.required_len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_load_error() {
        let err = Schema::from_json_file(Path::new("/nonexistent/ledatronic.json")).unwrap_err();
        assert!(matches!(err, SchemaError::LoadFailed(_)));
    }
}
