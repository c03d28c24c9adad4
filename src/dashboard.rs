//! Report assembly.
//!
//! Ties a loaded table, the user's choices and the configuration together:
//! validate columns and metric, apply selections, pick the dimension,
//! aggregate and wrap the groups into a [`Report`].

use crate::analysis::{
    aggregate, apply_selections, available_dimensions, distinct_values, resolve_dimension,
    AggregateParams, Selections,
};
use crate::config::Config;
use crate::error::{ReportError, Result};
use crate::loader::Table;
use crate::models::{Report, ReportMetadata};
use crate::rules::{ClassificationRule, ReportKind, ReportProfile, SortDirection, SortMetric};
use chrono::Utc;
use tracing::{debug, info};

/// The user's choices for one report.
#[derive(Debug, Clone)]
pub struct DashboardRequest {
    pub kind: ReportKind,
    /// Dimension to group by; the kind's default when `None`.
    pub dimension: Option<String>,
    /// Sort metric; the kind's default when `None`.
    pub metric: Option<SortMetric>,
    pub direction: SortDirection,
    pub show_negative: bool,
    pub selections: Selections,
}

impl DashboardRequest {
    /// Request with every choice left at its default.
    pub fn new(kind: ReportKind) -> Self {
        Self {
            kind,
            dimension: None,
            metric: None,
            direction: SortDirection::Descending,
            show_negative: false,
            selections: Selections::new(),
        }
    }
}

/// Build the profile of a kind with configured column names and marks.
pub fn profile_for(kind: ReportKind, config: &Config) -> ReportProfile {
    let mut profile = ReportProfile::new(kind);
    profile.subject_field = config.fields.subject.clone();
    profile.pass_mark = config.report.pass_mark;

    if kind == ReportKind::Score {
        profile.rule = ClassificationRule::Examined {
            absent_marker: config.report.absent_marker.clone(),
        };
    }

    profile
}

/// Choose and check the sort metric.
pub fn resolve_metric(kind: ReportKind, requested: Option<SortMetric>) -> Result<SortMetric> {
    let metric = requested.unwrap_or_else(|| kind.default_metric());

    if kind.metrics().contains(&metric) {
        Ok(metric)
    } else {
        Err(ReportError::UnsupportedMetric {
            metric: metric.to_string(),
            kind: kind.to_string(),
        })
    }
}

/// Dimensions offered for this table and selection state.
pub fn dimensions_for(request: &DashboardRequest, config: &Config) -> Vec<String> {
    available_dimensions(
        &config.fields.dimensions,
        &config.fields.course,
        &request.selections,
    )
}

fn default_dimension(kind: ReportKind, available: &[String]) -> String {
    let preferred = kind.default_dimension();
    if available.iter().any(|d| d == preferred) {
        preferred.to_string()
    } else {
        available
            .first()
            .cloned()
            .unwrap_or_else(|| preferred.to_string())
    }
}

/// Build a complete report from a loaded table.
pub fn build_report(table: &Table, request: &DashboardRequest, config: &Config) -> Result<Report> {
    let kind = request.kind;
    let profile = profile_for(kind, config);
    let metric = resolve_metric(kind, request.metric)?;

    let mut required = vec![profile.subject_field.clone(), profile.outcome_field.clone()];
    if let Some(field) = kind.required_filter() {
        required.push(field.to_string());
    }
    for (field, selection) in request.selections.iter() {
        if !selection.is_empty() {
            required.push(field.clone());
        }
    }
    table.require_columns(&required)?;

    let selected = apply_selections(
        &table.records,
        &request.selections,
        kind.required_filter(),
        &config.fields.course,
    )?;

    let available = dimensions_for(request, config);
    let fallback = default_dimension(kind, &available);
    let dimension = resolve_dimension(request.dimension.as_deref(), &fallback, &available)?;
    table.require_columns(&[dimension.as_str()])?;

    info!(
        "Building {} report by '{}' over {} of {} records",
        kind,
        dimension,
        selected.len(),
        table.records.len()
    );

    let params = AggregateParams {
        profile: &profile,
        dimension: &dimension,
        metric,
        direction: request.direction,
        pin_perfect: kind.pins_perfect(),
        show_negative: request.show_negative,
    };
    let aggregation = aggregate(&selected, &params);

    let metadata = ReportMetadata {
        kind,
        title: kind.title().to_string(),
        source: table.source.clone(),
        dimension: dimension.clone(),
        metric: metric.to_string(),
        descending: request.direction == SortDirection::Descending,
        generated_at: Utc::now(),
        records_loaded: table.records.len(),
        records_selected: selected.len(),
        dropped_records: aggregation.dropped,
        group_count: aggregation.groups.len(),
    };

    debug!("Report has {} groups", metadata.group_count);

    Ok(Report {
        metadata,
        groups: aggregation.groups,
        show_negative: request.show_negative,
    })
}

/// Dimensions and filter values a user can choose from.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub dimensions: Vec<String>,
    /// `(column, distinct values)` for the required filter and the course column.
    pub filters: Vec<(String, Vec<String>)>,
}

/// List what can be selected for a table.
pub fn list_options(table: &Table, request: &DashboardRequest, config: &Config) -> Options {
    let mut filters = Vec::new();
    let filter_fields = request
        .kind
        .required_filter()
        .into_iter()
        .chain(std::iter::once(config.fields.course.as_str()));

    for field in filter_fields {
        if table.has_column(field) {
            filters.push((field.to_string(), distinct_values(&table.records, field)));
        }
    }

    Options {
        dimensions: dimensions_for(request, config),
        filters,
    }
}
