//! Analysis modules.
//!
//! Selection, grouping, statistics and ordering of report records.

pub mod aggregator;
pub mod ranking;
pub mod scores;
pub mod selection;

pub use aggregator::*;
pub use ranking::{metric_value, sort_groups};
pub use scores::{score_bands, score_stats};
pub use selection::{
    apply_selections, available_dimensions, distinct_values, resolve_dimension, Selection,
    Selections,
};

/// Percentage of `part` in `total`, 0 when `total` is 0.
pub fn rate(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
