//! Markdown and JSON report generation.
//!
//! This module renders a [`Report`] as a Markdown document (metadata,
//! overall summary and one table row per group) or as pretty JSON.

use crate::analysis::rate;
use crate::models::{display_2dp, GroupSummary, Report, ReportMetadata};
use crate::rules::ReportKind;
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!("# {}\n\n", report.metadata.title));

    // Metadata section
    output.push_str(&generate_metadata_section(&report.metadata));

    // Overall summary
    output.push_str(&generate_summary_section(report));

    // Groups
    output.push_str(&generate_groups_section(report));

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Dimension:** {}\n", metadata.dimension));
    section.push_str(&format!(
        "- **Sorted by:** {} ({})\n",
        metadata.metric,
        if metadata.descending {
            "descending"
        } else {
            "ascending"
        }
    ));
    section.push_str(&format!(
        "- **Records:** {} loaded, {} selected\n",
        metadata.records_loaded, metadata.records_selected
    ));
    if metadata.dropped_records > 0 {
        section.push_str(&format!(
            "- **Records without {}:** {}\n",
            metadata.dimension, metadata.dropped_records
        ));
    }
    section.push_str(&format!("- **Groups:** {}\n", metadata.group_count));
    section.push('\n');

    section
}

/// Generate the overall summary across all groups.
fn generate_summary_section(report: &Report) -> String {
    let mut section = String::new();
    let labels = report.metadata.kind.labels();

    let total: usize = report.groups.iter().map(|g| g.total_count).sum();
    let positive: usize = report.groups.iter().map(|g| g.positive_count).sum();
    let negative: usize = report.groups.iter().map(|g| g.negative_count).sum();

    section.push_str("## Summary\n\n");
    section.push_str(&format!(
        "| 总人次 | {} | {} | {} |\n",
        labels.positive, labels.negative, labels.rate
    ));
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {}% |\n\n",
        total,
        positive,
        negative,
        display_2dp(rate(positive, total))
    ));

    section
}

/// Generate the per-group table.
fn generate_groups_section(report: &Report) -> String {
    let mut section = String::new();
    let dimension = &report.metadata.dimension;

    section.push_str(&format!("## 按 {} 维度分析\n\n", dimension));

    if report.groups.is_empty() {
        section.push_str("No records matched the current selection.\n\n");
        return section;
    }

    let kind = report.metadata.kind;
    let mut headers = vec![escape_cell(dimension)];
    headers.extend(column_headers(kind).into_iter().map(String::from));
    if report.show_negative {
        headers.push(kind.labels().names.to_string());
    }

    section.push_str(&format!("| {} |\n", headers.join(" | ")));
    section.push_str(&format!(
        "|:---|{}\n",
        ":---:|".repeat(headers.len() - 1)
    ));

    for group in &report.groups {
        let mut cells = vec![escape_cell(&group.group)];
        cells.extend(row_cells(kind, group));
        if report.show_negative {
            cells.push(escape_cell(group.negative_names.as_deref().unwrap_or("")));
        }
        section.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    section.push('\n');

    section
}

/// Column headers after the dimension column.
fn column_headers(kind: ReportKind) -> Vec<&'static str> {
    let labels = kind.labels();
    match kind {
        ReportKind::Watch => vec![
            "总人次",
            "平均观看时长",
            "最高观看时长",
            "最低观看时长",
            labels.positive,
            labels.negative,
        ],
        ReportKind::Score => vec![
            "总人次",
            "平均成绩",
            "及格人次",
            "及格率",
            labels.positive,
            labels.negative,
            "最高分",
            "最低分",
            "0-59",
            "60-69",
            "70-79",
            "80-89",
            "90-99",
            "100",
        ],
        _ => vec!["总人次", labels.positive, labels.negative, labels.rate],
    }
}

/// Cells matching [`column_headers`].
fn row_cells(kind: ReportKind, group: &GroupSummary) -> Vec<String> {
    let mut cells = vec![group.total_count.to_string()];

    match (kind, &group.watch, &group.scores) {
        (ReportKind::Watch, Some(watch), _) => {
            cells.push(watch.mean_display.clone());
            cells.push(watch.max_display.clone());
            cells.push(watch.min_display.clone());
            cells.push(group.positive_count.to_string());
            cells.push(group.negative_count.to_string());
        }
        (ReportKind::Score, _, Some(scores)) => {
            cells.push(scores.mean_display.clone());
            cells.push(scores.pass.to_string());
            cells.push(format!("{}%", scores.pass_rate_display));
            cells.push(scores.examined.to_string());
            cells.push(scores.absent.to_string());
            cells.push(scores.max_display.clone());
            cells.push(scores.min_display.clone());
            let bands = &scores.bands;
            for count in [
                bands.below_60,
                bands.from_60,
                bands.from_70,
                bands.from_80,
                bands.from_90,
                bands.perfect,
            ] {
                cells.push(count.to_string());
            }
        }
        _ => {
            cells.push(group.positive_count.to_string());
            cells.push(group.negative_count.to_string());
            cells.push(format!("{}%", group.rate_display));
        }
    }

    cells
}

/// Escape text for a Markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by CourseStat*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
