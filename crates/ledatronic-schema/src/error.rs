/// Errors raised while loading or validating a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Failed to read a schema file.
    #[error("schema load failed: {0}")]
    LoadFailed(String),

    /// The schema is not valid JSON or does not match the field shape.
    #[error("schema parse failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A field definition is malformed.
    #[error("invalid field '{name}': {reason}")]
    InvalidField { name: String, reason: String },

    /// Two fields share the same name.
    #[error("duplicate field '{0}'")]
    DuplicateField(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;

/// Non-fatal error for a single field of a decode pass.
///
/// Collected into the [`Snapshot`](crate::Snapshot); never aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldDecodeError {
    /// The payload ends before the field does.
    #[error("Not enough data for '{label}' (expected {expected} bytes, got {actual}). Skipping.")]
    InsufficientData {
        label: String,
        expected: usize,
        actual: usize,
    },

    /// Float fields are declared but never decoded.
    #[error("Float parsing not implemented for '{label}'.")]
    FloatNotImplemented { label: String },

    /// A mapped field without a map, or wider than one byte.
    #[error("Missing map or invalid length for mapped type '{label}'. Raw bytes: {raw_hex}")]
    InvalidMapped { label: String, raw_hex: String },

    /// The declared type is not known to the decoder.
    #[error("Unsupported data type '{type_name}' for '{label}'.")]
    UnsupportedType { type_name: String, label: String },

    /// Interpreting the field's bytes failed.
    #[error("Error parsing '{label}' (offset {offset}, length {length}): {reason}. Raw bytes: {raw_hex}")]
    Interpret {
        label: String,
        offset: usize,
        length: usize,
        reason: String,
        raw_hex: String,
    },
}
