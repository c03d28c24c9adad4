//! CSV export loading.
//!
//! Reads a spreadsheet export saved as CSV into records. Header names and
//! cells are trimmed and empty cells become `Missing`. Cell text is kept as
//! written; numeric columns are read on demand by the rules that need them.

use crate::error::{ReportError, Result};
use crate::models::{Record, Value};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// A loaded export.
#[derive(Debug, Clone)]
pub struct Table {
    /// Where the table came from (file name or label).
    pub source: String,
    /// Trimmed column names in file order.
    pub headers: Vec<String>,
    /// One record per data row.
    pub records: Vec<Record>,
}

impl Table {
    /// Whether a column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Fail with `MissingColumn` on the first absent column.
    pub fn require_columns<S: AsRef<str>>(&self, columns: &[S]) -> Result<()> {
        for column in columns {
            let column = column.as_ref();
            if !self.has_column(column) {
                return Err(ReportError::missing_column(column, &self.source));
            }
        }
        Ok(())
    }
}

/// Load a CSV export from disk.
pub fn load_csv(path: &Path) -> Result<Table> {
    if !path.is_file() {
        return Err(ReportError::MissingFile(path.to_path_buf()));
    }

    info!("Loading export: {}", path.display());
    let file = std::fs::File::open(path)?;
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    read_csv(file, &source)
}

/// Read CSV data from any reader.
pub fn read_csv<R: Read>(reader: R, source: &str) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let mut record = Record::new();

        for (header, cell) in headers.iter().zip(row.iter()) {
            if header.is_empty() {
                continue;
            }
            record.insert(header.clone(), Value::parse(cell));
        }

        records.push(record);
    }

    debug!(
        "Read {} rows with {} columns from {}",
        records.len(),
        headers.len(),
        source
    );

    Ok(Table {
        source: source.to_string(),
        headers,
        records,
    })
}
