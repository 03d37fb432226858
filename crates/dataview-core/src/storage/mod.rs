//! Dataset ingestion and export.

pub mod csv;
pub mod json;

use std::path::Path;

use crate::dataset::Dataset;
use crate::error::{DataviewError, Result};

pub use csv::{export_csv, export_filename, read_csv, write_csv};
pub use json::read_json;

/// Load a dataset from a path, dispatching on the file extension.
pub fn load_path(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => read_csv(path),
        "json" => read_json(path),
        _ => Err(DataviewError::UnsupportedFormat(
            path.display().to_string(),
        )),
    }
}
