//! Group ordering.

use crate::models::GroupSummary;
use crate::rules::{SortDirection, SortMetric};
use std::cmp::Ordering;

/// Numeric value of a metric for one group. Non-finite values read as 0.
pub fn metric_value(group: &GroupSummary, metric: SortMetric) -> f64 {
    let value = match metric {
        SortMetric::Rate => group.rate,
        SortMetric::Total => group.total_count as f64,
        SortMetric::Mean => group
            .watch
            .as_ref()
            .map(|w| w.mean)
            .or_else(|| group.scores.as_ref().map(|s| s.mean))
            .unwrap_or(0.0),
        SortMetric::Max => group
            .watch
            .as_ref()
            .map(|w| w.max)
            .or_else(|| group.scores.as_ref().map(|s| s.max))
            .unwrap_or(0.0),
        SortMetric::Min => group
            .watch
            .as_ref()
            .map(|w| w.min)
            .or_else(|| group.scores.as_ref().map(|s| s.min))
            .unwrap_or(0.0),
        SortMetric::PassRate => group.scores.as_ref().map(|s| s.pass_rate).unwrap_or(0.0),
    };

    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Whether every record of the group is positive.
pub fn is_perfect(group: &GroupSummary) -> bool {
    group.total_count > 0 && group.positive_count == group.total_count
}

/// Sort groups in place.
///
/// With `pin_perfect`, groups at a 100% rate come first whatever the
/// direction; the rest follow in the chosen direction. Equal keys keep
/// their incoming order.
pub fn sort_groups(
    groups: &mut [GroupSummary],
    metric: SortMetric,
    direction: SortDirection,
    pin_perfect: bool,
) {
    groups.sort_by(|a, b| {
        let pinned = if pin_perfect {
            is_perfect(b).cmp(&is_perfect(a))
        } else {
            Ordering::Equal
        };

        pinned.then_with(|| {
            let ord = metric_value(a, metric).total_cmp(&metric_value(b, metric));
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        })
    });
}
