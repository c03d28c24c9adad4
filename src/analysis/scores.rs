//! Score banding and per-group score statistics.

use crate::models::{display_2dp, Record, ScoreBands, ScoreStats};
use crate::rules::ReportProfile;

/// Count scores into the fixed bands.
///
/// Scores below 0 land in the lowest band and scores above 100 in the
/// perfect band, so every score is counted exactly once.
pub fn score_bands(scores: &[f64]) -> ScoreBands {
    let mut bands = ScoreBands::default();

    for &score in scores {
        if score >= 100.0 {
            bands.perfect += 1;
        } else if score >= 90.0 {
            bands.from_90 += 1;
        } else if score >= 80.0 {
            bands.from_80 += 1;
        } else if score >= 70.0 {
            bands.from_70 += 1;
        } else if score >= 60.0 {
            bands.from_60 += 1;
        } else {
            bands.below_60 += 1;
        }
    }

    bands
}

/// Examined scores of a group, in record order.
pub fn examined_scores(records: &[&Record], profile: &ReportProfile) -> Vec<f64> {
    records
        .iter()
        .map(|r| r.get(&profile.outcome_field))
        .filter(|v| profile.classify(v).is_positive())
        .filter_map(|v| v.as_number())
        .collect()
}

/// Statistics for one group of score records.
pub fn score_stats(records: &[&Record], profile: &ReportProfile) -> ScoreStats {
    let scores = examined_scores(records, profile);
    let examined = scores.len();
    let absent = records.len() - examined;
    let pass = scores.iter().filter(|&&s| s >= profile.pass_mark).count();

    let pass_rate = super::rate(pass, examined);
    let mean = if examined == 0 {
        0.0
    } else {
        scores.iter().sum::<f64>() / examined as f64
    };
    let max = scores.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let min = scores.iter().copied().reduce(f64::min).unwrap_or(0.0);

    ScoreStats {
        examined,
        absent,
        pass,
        pass_rate,
        pass_rate_display: display_2dp(pass_rate),
        mean,
        mean_display: display_2dp(mean),
        max,
        max_display: display_2dp(max),
        min,
        min_display: display_2dp(min),
        bands: score_bands(&scores),
    }
}
