//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.coursestat.toml` files.

use crate::rules::{self, ABSENT_MARKER, COURSE_FIELD, PASS_MARK, SUBJECT_FIELD};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".coursestat.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Column names.
    #[serde(default)]
    pub fields: FieldsConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "coursestat_report.md".to_string()
}

/// Column names used by every report kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldsConfig {
    /// Column holding the person name.
    #[serde(default = "default_subject")]
    pub subject: String,

    /// Columns offered as grouping dimensions.
    #[serde(default = "default_dimensions")]
    pub dimensions: Vec<String>,

    /// Course column; offered as a dimension while a course selection is active.
    #[serde(default = "default_course")]
    pub course: String,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            subject: default_subject(),
            dimensions: default_dimensions(),
            course: default_course(),
        }
    }
}

fn default_subject() -> String {
    SUBJECT_FIELD.to_string()
}

fn default_dimensions() -> Vec<String> {
    rules::DIMENSIONS.iter().map(|d| d.to_string()).collect()
}

fn default_course() -> String {
    COURSE_FIELD.to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the negative-name column.
    #[serde(default)]
    pub show_negative: bool,

    /// Sort descending (true) or ascending (false).
    #[serde(default = "default_true")]
    pub descending: bool,

    /// Pass mark for score reports.
    #[serde(default = "default_pass_mark")]
    pub pass_mark: f64,

    /// Cell text marking a missed exam.
    #[serde(default = "default_absent_marker")]
    pub absent_marker: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            show_negative: false,
            descending: true,
            pass_mark: default_pass_mark(),
            absent_marker: default_absent_marker(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_pass_mark() -> f64 {
    PASS_MARK
}

fn default_absent_marker() -> String {
    ABSENT_MARKER.to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if let Some(ref subject) = args.subject_field {
            self.fields.subject = subject.clone();
        }

        if let Some(pass_mark) = args.pass_mark {
            self.report.pass_mark = pass_mark;
        }

        // Flags always override
        if args.show_negative {
            self.report.show_negative = true;
        }
        if args.ascending {
            self.report.descending = false;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
