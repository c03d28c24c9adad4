//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::rules::{ReportKind, SortMetric};
use clap::Parser;
use std::path::PathBuf;

/// CourseStat - group-by dashboards for course exports
///
/// Groups attendance, quiz, video watch, task and score exports by school,
/// department, major, class, teacher or course and ranks the groups.
///
/// Examples:
///   coursestat --kind attendance --input 出勤.csv
///   coursestat --kind watch --input 音视频观看详情.csv --dimension 教师 --ascending
///   coursestat --kind score --input 成绩.csv --metric pass-rate --show-negative
///   coursestat --kind attendance --input 出勤.csv --select 时间=2024-03-01,2024-03-08
///   coursestat --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Report kind
    #[arg(short, long, value_name = "KIND", required_unless_present = "init_config")]
    pub kind: Option<KindArg>,

    /// CSV export to read
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Column to group by
    ///
    /// Defaults to 院系 (授课班级 for watch reports).
    #[arg(short, long, value_name = "COLUMN")]
    pub dimension: Option<String>,

    /// Metric to sort by
    ///
    /// Defaults to rate for attendance/quiz/task and mean for watch/score.
    #[arg(short, long, value_name = "METRIC")]
    pub metric: Option<MetricArg>,

    /// Sort ascending instead of descending
    #[arg(long)]
    pub ascending: bool,

    /// Add the list of negative subjects (absent, wrong, unwatched, ...) per group
    #[arg(long)]
    pub show_negative: bool,

    /// Restrict a column to some values (repeatable)
    ///
    /// Example: --select 课程=高等数学,大学英语
    /// An empty list (--select 时间=) deselects everything.
    #[arg(long, value_name = "COLUMN=V1,V2", value_parser = parse_selection)]
    pub select: Vec<(String, Vec<String>)>,

    /// Output file path for the report ("-" for stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .coursestat.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Column holding the person name
    #[arg(long, value_name = "COLUMN", env = "COURSESTAT_SUBJECT")]
    pub subject_field: Option<String>,

    /// Pass mark for score reports
    #[arg(long, value_name = "SCORE")]
    pub pass_mark: Option<f64>,

    /// Print the available dimensions and filter values, then exit
    #[arg(long)]
    pub list_dimensions: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .coursestat.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Report kind argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum KindArg {
    Attendance,
    Quiz,
    Watch,
    Task,
    Score,
}

impl From<KindArg> for ReportKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Attendance => ReportKind::Attendance,
            KindArg::Quiz => ReportKind::Quiz,
            KindArg::Watch => ReportKind::Watch,
            KindArg::Task => ReportKind::Task,
            KindArg::Score => ReportKind::Score,
        }
    }
}

/// Sort metric argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MetricArg {
    Rate,
    Mean,
    PassRate,
    Max,
    Min,
    Total,
}

impl From<MetricArg> for SortMetric {
    fn from(metric: MetricArg) -> Self {
        match metric {
            MetricArg::Rate => SortMetric::Rate,
            MetricArg::Mean => SortMetric::Mean,
            MetricArg::PassRate => SortMetric::PassRate,
            MetricArg::Max => SortMetric::Max,
            MetricArg::Min => SortMetric::Min,
            MetricArg::Total => SortMetric::Total,
        }
    }
}

/// Parse `COLUMN=V1,V2` into a column and its values.
fn parse_selection(raw: &str) -> Result<(String, Vec<String>), String> {
    let (field, values) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=V1,V2, got '{}'", raw))?;

    let field = field.trim();
    if field.is_empty() {
        return Err("column name must not be empty".to_string());
    }

    let values = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect();

    Ok((field.to_string(), values))
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(pass_mark) = self.pass_mark {
            if !pass_mark.is_finite() || pass_mark < 0.0 {
                return Err("Pass mark must be a non-negative number".to_string());
            }
        }

        if let Some(ref dimension) = self.dimension {
            if dimension.trim().is_empty() {
                return Err("Dimension must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the report kind (validated to be present).
    pub fn report_kind(&self) -> ReportKind {
        self.kind.map(ReportKind::from).unwrap_or(ReportKind::Attendance)
    }

    /// Returns true when the report goes to stdout.
    pub fn writes_to_stdout(&self) -> bool {
        self.output.as_deref().is_some_and(|p| p.as_os_str() == "-")
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` setting; `--quiet` wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
