//! JSON ingestion: an array of flat objects becomes a dataset.
//!
//! The first object's key order fixes the column order; later objects fill
//! the same columns and anything else they carry is ignored.

use std::path::Path;

use crate::dataset::{Dataset, Row};
use crate::error::{DataviewError, Result};
use crate::value::Value;

/// Read a JSON file into a dataset.
pub fn read_json(path: &Path) -> Result<Dataset> {
    let content = std::fs::read_to_string(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("dataset.json");
    parse_json_text(name, &content)
}

/// Parse JSON text into a dataset. Accepts an array of objects, or a
/// single object treated as a one-row dataset.
pub fn parse_json_text(name: &str, content: &str) -> Result<Dataset> {
    let parsed: serde_json::Value = serde_json::from_str(content)?;
    let objects: Vec<serde_json::Map<String, serde_json::Value>> = match parsed {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::Object(map) => Ok(map),
                other => Err(DataviewError::Parse {
                    line: 0,
                    message: format!("expected an object, found {}", kind_of(&other)),
                }),
            })
            .collect::<Result<_>>()?,
        serde_json::Value::Object(map) => vec![map],
        other => {
            return Err(DataviewError::Parse {
                line: 0,
                message: format!("expected an array of objects, found {}", kind_of(&other)),
            });
        }
    };

    let Some(first) = objects.first() else {
        return Err(DataviewError::EmptyInput);
    };
    let columns: Vec<String> = first.keys().cloned().collect();

    let rows: Vec<Row> = objects
        .into_iter()
        .map(|object| {
            object
                .into_iter()
                .map(|(key, value)| (key, convert(value)))
                .collect()
        })
        .collect();

    Ok(Dataset::new(name, columns, rows))
}

fn convert(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Empty,
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => Value::Number(f),
            _ => Value::Text(n.to_string()),
        },
        serde_json::Value::String(s) => Value::Text(s),
        serde_json::Value::Bool(b) => Value::Text(b.to_string()),
        // Nested structure is flattened to its JSON text.
        other => Value::Text(other.to_string()),
    }
}

fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
