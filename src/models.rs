//! Data models for course reports.
//!
//! This module contains the core data structures shared by the loader,
//! the aggregator and the report renderers.

use crate::rules::ReportKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single spreadsheet cell.
///
/// Loaded cells keep their trimmed text; numbers are read on demand through
/// [`Value::as_number`] so codes such as `007` or 18-digit IDs keep their
/// exact spelling when grouped, filtered or listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A numeric cell built in code.
    Number(f64),
    /// A non-empty cell as it appeared in the export.
    Text(String),
    /// An empty cell.
    Missing,
}

static MISSING: Value = Value::Missing;

impl Value {
    /// Resolve a raw cell.
    ///
    /// Surrounding whitespace is ignored and empty cells become `Missing`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Value::Missing
        } else {
            Value::Text(trimmed.to_string())
        }
    }

    /// Returns true for empty cells.
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric reading of the cell.
    ///
    /// Text that still parses as a finite number is accepted; anything else
    /// yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Number(_) => None,
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Value::Missing => None,
        }
    }

    /// Textual reading of the cell, if it holds text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Key used to group and filter on this cell.
    ///
    /// Returns `None` for missing cells and non-finite numbers.
    pub fn key(&self) -> Option<String> {
        match self {
            Value::Missing => None,
            Value::Number(n) if !n.is_finite() => None,
            _ => Some(self.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Missing => Ok(()),
        }
    }
}

/// One row of an export: field name to typed value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from `(field, value)` pairs.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            fields: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Sets a field value.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    /// Returns the value of a field, `Missing` when the field is absent.
    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&MISSING)
    }

    /// Returns the grouping key of a field.
    pub fn key(&self, field: &str) -> Option<String> {
        self.get(field).key()
    }
}

/// Positive/negative classification of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Present, correct, watched, completed or examined.
    Positive,
    /// Absent, wrong, unwatched, incomplete or missed the exam.
    Negative,
}

impl Outcome {
    /// Maps a predicate result onto an outcome.
    pub fn from_bool(positive: bool) -> Self {
        if positive {
            Outcome::Positive
        } else {
            Outcome::Negative
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Outcome::Positive)
    }
}

/// Counts of examined scores per fixed band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBands {
    /// Scores in [0, 60).
    pub below_60: usize,
    /// Scores in [60, 70).
    pub from_60: usize,
    /// Scores in [70, 80).
    pub from_70: usize,
    /// Scores in [80, 90).
    pub from_80: usize,
    /// Scores in [90, 100).
    pub from_90: usize,
    /// Scores of 100, plus anything above.
    pub perfect: usize,
}

impl ScoreBands {
    /// Sum over all bands.
    pub fn total(&self) -> usize {
        self.below_60 + self.from_60 + self.from_70 + self.from_80 + self.from_90 + self.perfect
    }
}

/// Score statistics for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreStats {
    /// Records with a numeric score.
    pub examined: usize,
    /// Records with no score or the absence marker.
    pub absent: usize,
    /// Examined records at or above the pass mark.
    pub pass: usize,
    /// `pass / examined * 100`, 0 when nobody was examined.
    pub pass_rate: f64,
    pub pass_rate_display: String,
    pub mean: f64,
    pub mean_display: String,
    pub max: f64,
    pub max_display: String,
    pub min: f64,
    pub min_display: String,
    pub bands: ScoreBands,
}

/// Watch-time statistics for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchStats {
    /// Sum of all present durations.
    pub total_duration: f64,
    /// `total_duration / total_count`.
    pub mean: f64,
    pub mean_display: String,
    pub max: f64,
    pub max_display: String,
    pub min: f64,
    pub min_display: String,
}

/// Aggregated view of all records sharing one dimension value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// The dimension value identifying the group.
    pub group: String,
    pub total_count: usize,
    pub positive_count: usize,
    pub negative_count: usize,
    /// `positive_count / total_count * 100`, 0 for an empty group.
    pub rate: f64,
    /// Rate rounded to two decimals.
    pub rate_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch: Option<WatchStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<ScoreStats>,
    /// Sorted, de-duplicated negative subjects joined with ", ".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_names: Option<String>,
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub kind: ReportKind,
    /// Report title.
    pub title: String,
    /// Export file the records came from.
    pub source: String,
    /// Field the records were grouped by.
    pub dimension: String,
    /// Metric the groups were sorted by.
    pub metric: String,
    /// Whether the sort was descending.
    pub descending: bool,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
    /// Records read from the export.
    pub records_loaded: usize,
    /// Records left after applying the selections.
    pub records_selected: usize,
    /// Selected records with no usable dimension value.
    pub dropped_records: usize,
    /// Number of groups in the report.
    pub group_count: usize,
}

/// A complete dimensional report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    /// Groups in display order.
    pub groups: Vec<GroupSummary>,
    /// Whether the negative-name column was requested.
    pub show_negative: bool,
}

/// Rounds to two decimals for display.
pub fn display_2dp(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("{:.2}", value)
}
