//! Error types for report generation.
//!
//! Every variant is terminal for the current report only. Numeric coercion
//! failures and empty groups never show up here: they are recovered where
//! they happen.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors raised while loading, filtering or aggregating a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The export file does not exist.
    #[error("export file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// An expected column is absent from the loaded table.
    #[error("column '{column}' not found in {source_name}")]
    MissingColumn { column: String, source_name: String },

    /// The user deselected every option of a required filter.
    #[error("select at least one value for '{0}'")]
    EmptySelection(String),

    /// The requested sort metric is not offered by this report kind.
    #[error("metric '{metric}' is not available for {kind} reports")]
    UnsupportedMetric { metric: String, kind: String },

    /// The requested dimension is not in the available dimension list.
    #[error("dimension '{dimension}' is not available (choose one of: {available})")]
    UnknownDimension { dimension: String, available: String },

    /// The CSV reader failed.
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    /// Create a missing column error.
    pub fn missing_column(column: impl Into<String>, source_name: impl Into<String>) -> Self {
        ReportError::MissingColumn {
            column: column.into(),
            source_name: source_name.into(),
        }
    }
}
