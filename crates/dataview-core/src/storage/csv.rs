//! CSV ingestion and export.
//!
//! Export is intentionally lossy: it writes the cell grid only, never the
//! variable metadata, and only comma-bearing fields are quoted.

use std::path::Path;

use crate::dataset::{Dataset, Row};
use crate::error::{DataviewError, Result};
use crate::value::{Value, parses_as_number};

/// Read a CSV file into a dataset. The first line is the header and fixes
/// the column order.
pub fn read_csv(path: &Path) -> Result<Dataset> {
    let content = std::fs::read_to_string(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("dataset.csv");
    parse_csv_text(name, &content)
}

/// Parse CSV text into a dataset.
pub fn parse_csv_text(name: &str, content: &str) -> Result<Dataset> {
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());

    let header = lines.next().ok_or(DataviewError::EmptyInput)?;
    let columns: Vec<String> = parse_csv_line(header);
    if columns.iter().all(String::is_empty) {
        return Err(DataviewError::EmptyInput);
    }

    let rows: Vec<Row> = lines
        .map(|line| {
            let fields = parse_csv_line(line);
            columns
                .iter()
                .enumerate()
                .map(|(i, col)| {
                    let value = fields.get(i).map(|f| parse_field(f)).unwrap_or_default();
                    (col.clone(), value)
                })
                .collect()
        })
        .collect();

    Ok(Dataset::new(name, columns, rows))
}

/// Parse a single CSV line, handling quoted fields and doubled quotes.
pub(crate) fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut field_was_quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                // Check for escaped quote
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else {
            match c {
                '"' => {
                    in_quotes = true;
                    field_was_quoted = true;
                }
                ',' => {
                    if field_was_quoted {
                        fields.push(current.clone());
                    } else {
                        fields.push(current.trim().to_string());
                    }
                    current = String::new();
                    field_was_quoted = false;
                }
                _ => current.push(c),
            }
        }
    }
    if field_was_quoted {
        fields.push(current);
    } else {
        fields.push(current.trim().to_string());
    }
    fields
}

/// Type a raw CSV field.
/// - Empty string -> empty value
/// - Finite number -> number (unless it has leading zeros like "007")
/// - Otherwise -> text
pub(crate) fn parse_field(field: &str) -> Value {
    if field.is_empty() {
        return Value::Empty;
    }

    // Keep explicit surrounding whitespace (typically from quoted CSV
    // fields) exactly as text.
    let trimmed = field.trim();
    if field != trimmed {
        return Value::Text(field.to_string());
    }

    // Preserve strings that look like numbers but have leading zeros
    // (e.g. "007"), unless they're just "0" or start with "0."
    if trimmed.starts_with('0')
        && trimmed.len() > 1
        && !trimmed.starts_with("0.")
        && trimmed.chars().nth(1).is_some_and(|c| c.is_ascii_digit())
    {
        return Value::Text(trimmed.to_string());
    }

    if let Some(n) = parses_as_number(trimmed) {
        return Value::Number(n);
    }

    Value::Text(trimmed.to_string())
}

/// Render the dataset as CSV text: header row of column names, then every
/// row with cells stringified (empty cells become empty fields). Only
/// fields containing a comma are wrapped in quotes; inside a wrapped field
/// embedded quotes are doubled. Variable metadata is not encoded.
pub fn export_csv(dataset: &Dataset) -> String {
    let mut lines = Vec::with_capacity(dataset.row_count() + 1);
    lines.push(dataset.columns().join(","));
    for row_index in 0..dataset.row_count() {
        let fields: Vec<String> = dataset
            .columns()
            .iter()
            .map(|col| escape_field(&dataset.value(row_index, col).display()))
            .collect();
        lines.push(fields.join(","));
    }
    lines.join("\n")
}

/// Write the dataset to a CSV file.
pub fn write_csv(path: &Path, dataset: &Dataset) -> Result<()> {
    std::fs::write(path, export_csv(dataset))?;
    Ok(())
}

/// Suggested export file name: the dataset name with its extension
/// replaced by `_edited.csv`.
pub fn export_filename(name: &str) -> String {
    let stem = match name.rfind('.') {
        // A leading dot is a hidden-file prefix, not an extension.
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    };
    format!("{}_edited.csv", stem)
}

fn escape_field(field: &str) -> String {
    if field.contains(',') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CellRef;

    #[test]
    fn test_parse_csv_line_simple() {
        assert_eq!(parse_csv_line("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_csv_line_quoted() {
        assert_eq!(
            parse_csv_line(r#"a,"hello, world",c"#),
            vec!["a", "hello, world", "c"]
        );
    }

    #[test]
    fn test_parse_csv_line_escaped_quotes() {
        assert_eq!(
            parse_csv_line(r#"a,"say ""hello""",c"#),
            vec!["a", r#"say "hello""#, "c"]
        );
    }

    #[test]
    fn test_parse_field_typing() {
        assert_eq!(parse_field("42"), Value::Number(42.0));
        assert_eq!(parse_field("0"), Value::Number(0.0));
        assert_eq!(parse_field("0.5"), Value::Number(0.5));
        assert_eq!(parse_field("007"), Value::Text("007".to_string()));
        assert_eq!(parse_field("hello"), Value::Text("hello".to_string()));
        assert_eq!(parse_field(""), Value::Empty);
        assert_eq!(parse_field("inf"), Value::Text("inf".to_string()));
    }

    #[test]
    fn test_parse_csv_text_header_fixes_column_order() {
        let ds = parse_csv_text("t.csv", "b,a\n1,2\n3,4\n").unwrap();
        assert_eq!(ds.columns(), &["b".to_string(), "a".to_string()]);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.value(1, "a"), &Value::Number(4.0));
    }

    #[test]
    fn test_parse_csv_text_short_rows_backfill_empty() {
        let ds = parse_csv_text("t.csv", "a,b,c\n1,2\n").unwrap();
        assert_eq!(ds.value(0, "c"), &Value::Empty);
    }

    #[test]
    fn test_parse_csv_text_rejects_empty_input() {
        assert!(matches!(
            parse_csv_text("t.csv", ""),
            Err(DataviewError::EmptyInput)
        ));
        assert!(matches!(
            parse_csv_text("t.csv", "\n \n"),
            Err(DataviewError::EmptyInput)
        ));
    }

    #[test]
    fn test_export_quotes_only_comma_fields() {
        let ds = parse_csv_text("t.csv", "a,b\nplain,\"x, y\"\n").unwrap();
        assert_eq!(export_csv(&ds), "a,b\nplain,\"x, y\"");
    }

    #[test]
    fn test_export_stringifies_empty_cells() {
        let mut ds = parse_csv_text("t.csv", "a,b\n1,2\n").unwrap();
        ds.set_value(CellRef::new(0, 1), Value::Empty).unwrap();
        assert_eq!(export_csv(&ds), "a,b\n1,");
    }

    #[test]
    fn test_export_parse_round_trip_preserves_shape() {
        let original = "name,notes\nada,\"likes, commas\"\ngrace,plain\n";
        let ds = parse_csv_text("t.csv", original).unwrap();
        let reparsed = parse_csv_text("t.csv", &export_csv(&ds)).unwrap();
        assert_eq!(reparsed.columns(), ds.columns());
        assert_eq!(reparsed.row_count(), ds.row_count());
        assert_eq!(
            reparsed.value(0, "notes"),
            &Value::Text("likes, commas".to_string())
        );
    }

    #[test]
    fn test_export_filename_replaces_extension() {
        assert_eq!(export_filename("survey.csv"), "survey_edited.csv");
        assert_eq!(export_filename("survey.data.json"), "survey.data_edited.csv");
        assert_eq!(export_filename("noext"), "noext_edited.csv");
        assert_eq!(export_filename(".hidden"), ".hidden_edited.csv");
    }

    #[test]
    fn test_write_and_read_csv_file() {
        let path = std::env::temp_dir().join(format!(
            "dataview_csv_roundtrip_{}_{:?}.csv",
            std::process::id(),
            std::thread::current().id(),
        ));
        struct Cleanup(std::path::PathBuf);
        impl Drop for Cleanup {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.0);
            }
        }
        let _cleanup = Cleanup(path.clone());

        let ds = parse_csv_text("t.csv", "a,b\n1,two\n").unwrap();
        write_csv(&path, &ds).unwrap();
        let back = read_csv(&path).unwrap();
        assert_eq!(back.columns(), ds.columns());
        assert_eq!(back.value(0, "a"), &Value::Number(1.0));
        assert_eq!(back.value(0, "b"), &Value::Text("two".to_string()));
    }
}
