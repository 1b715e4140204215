use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use ledatronic_schema::{ByteOrder, FieldDef, FieldKind, Schema, Snapshot};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn print_snapshot(snapshot: &Snapshot, schema: &Schema, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(snapshot).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE", "UNIT", "LABEL"]);
            for (name, value) in snapshot.fields() {
                let field = schema.get(name);
                table.add_row(vec![
                    name.to_string(),
                    value.map(ToString::to_string).unwrap_or_else(|| "-".to_string()),
                    field.and_then(|f| f.unit.clone()).unwrap_or_default(),
                    field.map(|f| f.label.clone()).unwrap_or_default(),
                ]);
            }
            println!("{table}");

            if !snapshot.errors().is_empty() {
                let mut errors = Table::new();
                errors
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(vec!["DECODE ERROR"]);
                for message in snapshot.error_messages() {
                    errors.add_row(vec![message]);
                }
                println!("{errors}");
            }
        }
        OutputFormat::Pretty => {
            let line = snapshot
                .fields()
                .map(|(name, value)| match value {
                    Some(value) => format!("{name}={value}"),
                    None => format!("{name}=-"),
                })
                .collect::<Vec<_>>()
                .join(" ");
            println!("{line}");
            for message in snapshot.error_messages() {
                println!("  error: {message}");
            }
        }
    }
}

#[derive(Serialize)]
struct FieldOutput<'a> {
    name: &'a str,
    offset: usize,
    length: usize,
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    byteorder: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoding: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    map: Option<Vec<(u64, &'a str)>>,
    label: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<&'a str>,
}

impl<'a> From<&'a FieldDef> for FieldOutput<'a> {
    fn from(field: &'a FieldDef) -> Self {
        Self {
            name: &field.name,
            offset: field.offset,
            length: field.length,
            kind: field.kind.type_name(),
            byteorder: byte_order(&field.kind).map(ByteOrder::as_str),
            encoding: match &field.kind {
                FieldKind::Text { encoding } => Some(encoding.as_str()),
                _ => None,
            },
            map: match &field.kind {
                FieldKind::Mapped { map: Some(map) } => Some(map.iter().collect()),
                _ => None,
            },
            label: &field.label,
            unit: field.unit.as_deref(),
        }
    }
}

pub fn print_schema(schema: &Schema, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let fields: Vec<FieldOutput<'_>> = schema.iter().map(FieldOutput::from).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&fields).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "OFFSET", "LEN", "TYPE", "BYTEORDER", "UNIT", "LABEL"]);
            for field in schema {
                table.add_row(vec![
                    field.name.clone(),
                    field.offset.to_string(),
                    field.length.to_string(),
                    field.kind.type_name().to_string(),
                    byte_order(&field.kind)
                        .map(|order| order.as_str().to_string())
                        .unwrap_or_default(),
                    field.unit.clone().unwrap_or_default(),
                    field.label.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for field in schema {
                println!(
                    "{:<26} [{:>2}..{:>2}) {}",
                    field.name,
                    field.offset,
                    field.end(),
                    field.kind.type_name()
                );
            }
        }
    }
}

fn byte_order(kind: &FieldKind) -> Option<ByteOrder> {
    match kind {
        FieldKind::Int { byte_order } => Some(*byte_order),
        _ => None,
    }
}
