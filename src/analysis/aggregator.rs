//! Dimensional aggregation.
//!
//! This module groups records by one dimension, counts positive and
//! negative outcomes per group, attaches the per-kind statistics and
//! orders the result.

use super::ranking::sort_groups;
use super::rate;
use super::scores::score_stats;
use crate::models::{display_2dp, GroupSummary, Outcome, Record, WatchStats};
use crate::rules::{ReportKind, ReportProfile, SortDirection, SortMetric};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Parameters of one aggregation pass.
#[derive(Debug, Clone)]
pub struct AggregateParams<'a> {
    pub profile: &'a ReportProfile,
    /// Field the records are grouped by.
    pub dimension: &'a str,
    pub metric: SortMetric,
    pub direction: SortDirection,
    /// Pin 100% groups to the top.
    pub pin_perfect: bool,
    /// Materialize the negative-name list per group.
    pub show_negative: bool,
}

impl<'a> AggregateParams<'a> {
    /// Parameters with the kind's defaults.
    pub fn new(profile: &'a ReportProfile, dimension: &'a str) -> Self {
        Self {
            profile,
            dimension,
            metric: profile.kind.default_metric(),
            direction: SortDirection::Descending,
            pin_perfect: profile.kind.pins_perfect(),
            show_negative: false,
        }
    }
}

/// Output of an aggregation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    /// One summary per dimension value, in display order.
    pub groups: Vec<GroupSummary>,
    /// Records without a usable dimension value.
    pub dropped: usize,
}

/// Group records by dimension value.
///
/// Records whose dimension value is missing are left out and counted
/// separately. Groups are keyed in lexical order.
pub fn group_by_dimension<'r>(
    records: &'r [Record],
    dimension: &str,
) -> (BTreeMap<String, Vec<&'r Record>>, usize) {
    let mut grouped: BTreeMap<String, Vec<&Record>> = BTreeMap::new();
    let mut dropped = 0usize;

    for record in records {
        match record.key(dimension) {
            Some(key) => grouped.entry(key).or_default().push(record),
            None => dropped += 1,
        }
    }

    (grouped, dropped)
}

/// Aggregate and sort a record set.
pub fn aggregate(records: &[Record], params: &AggregateParams<'_>) -> Aggregation {
    let profile = params.profile;
    let (grouped, dropped) = group_by_dimension(records, params.dimension);

    if dropped > 0 {
        warn!(
            "{} record(s) have no '{}' value and were left out",
            dropped, params.dimension
        );
    }

    let mut groups: Vec<GroupSummary> = grouped
        .iter()
        .map(|(key, members)| {
            let mut summary = summarize_group(key, members, profile);
            if params.show_negative {
                summary.negative_names = Some(negative_names(
                    records,
                    params.dimension,
                    key,
                    profile,
                ));
            }
            summary
        })
        .collect();

    sort_groups(
        &mut groups,
        params.metric,
        params.direction,
        params.pin_perfect,
    );

    debug!(
        "Aggregated {} records into {} groups by '{}'",
        records.len(),
        groups.len(),
        params.dimension
    );

    Aggregation { groups, dropped }
}

/// Summary of the records of one group.
pub fn summarize_group(key: &str, members: &[&Record], profile: &ReportProfile) -> GroupSummary {
    let total_count = members.len();
    let positive_count = members
        .iter()
        .filter(|r| profile.classify(r.get(&profile.outcome_field)).is_positive())
        .count();
    let negative_count = total_count - positive_count;
    let rate = rate(positive_count, total_count);

    let watch = (profile.kind == ReportKind::Watch).then(|| watch_stats(members, profile));
    let scores = (profile.kind == ReportKind::Score).then(|| score_stats(members, profile));

    GroupSummary {
        group: key.to_string(),
        total_count,
        positive_count,
        negative_count,
        rate,
        rate_display: display_2dp(rate),
        watch,
        scores,
        negative_names: None,
    }
}

/// Watch-time statistics of one group.
///
/// Durations that do not read as numbers count as zero toward the mean
/// and are skipped for max/min.
pub fn watch_stats(members: &[&Record], profile: &ReportProfile) -> WatchStats {
    let mut durations = Vec::with_capacity(members.len());

    for record in members {
        let value = record.get(&profile.outcome_field);
        match value.as_number() {
            Some(d) => durations.push(d),
            None if !value.is_missing() => {
                debug!("Unreadable duration '{}' treated as zero", value);
            }
            None => {}
        }
    }

    let total_duration: f64 = durations.iter().sum();
    let mean = if members.is_empty() {
        0.0
    } else {
        total_duration / members.len() as f64
    };
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);

    WatchStats {
        total_duration,
        mean,
        mean_display: display_2dp(mean),
        max,
        max_display: display_2dp(max),
        min,
        min_display: display_2dp(min),
    }
}

/// Negative subjects of one group, sorted and de-duplicated.
///
/// Re-filters the full record set by dimension value and outcome. Records
/// without a subject name count toward the totals but are not listed. An
/// empty list becomes the profile's sentinel text.
pub fn negative_names(
    records: &[Record],
    dimension: &str,
    group: &str,
    profile: &ReportProfile,
) -> String {
    let names: BTreeSet<String> = records
        .iter()
        .filter(|r| r.key(dimension).as_deref() == Some(group))
        .filter(|r| profile.classify(r.get(&profile.outcome_field)) == Outcome::Negative)
        .filter_map(|r| r.key(&profile.subject_field))
        .collect();

    if names.is_empty() {
        profile.sentinel.clone()
    } else {
        names.into_iter().collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn attendance(name: &str, dept: &str, status: &str) -> Record {
        Record::from_pairs([
            ("姓名", text(name)),
            ("院系", text(dept)),
            ("签到状态", text(status)),
        ])
    }

    fn watch(name: &str, class: &str, duration: Value) -> Record {
        Record::from_pairs([
            ("姓名", text(name)),
            ("授课班级", text(class)),
            ("观看时长", duration),
        ])
    }

    fn find<'a>(groups: &'a [GroupSummary], name: &str) -> &'a GroupSummary {
        groups.iter().find(|g| g.group == name).unwrap()
    }

    #[test]
    fn test_attendance_example() {
        let records = vec![
            attendance("张三", "A", "已签"),
            attendance("李四", "A", "缺勤"),
            attendance("王五", "B", "已签"),
        ];
        let profile = ReportProfile::new(ReportKind::Attendance);
        let params = AggregateParams::new(&profile, "院系");

        let result = aggregate(&records, &params);
        assert_eq!(result.dropped, 0);
        assert_eq!(result.groups.len(), 2);

        let b = &result.groups[0];
        assert_eq!(b.group, "B");
        assert_eq!(b.total_count, 1);
        assert_eq!(b.positive_count, 1);
        assert_eq!(b.rate, 100.0);
        assert_eq!(b.rate_display, "100.00");

        let a = &result.groups[1];
        assert_eq!(a.group, "A");
        assert_eq!(a.total_count, 2);
        assert_eq!(a.positive_count, 1);
        assert_eq!(a.negative_count, 1);
        assert_eq!(a.rate, 50.0);
    }

    #[test]
    fn test_counts_add_up_and_rate_in_range() {
        let statuses = ["已签", "缺勤", "教师代签", "事假", "已签", "迟到"];
        let records: Vec<Record> = statuses
            .iter()
            .enumerate()
            .map(|(i, s)| attendance(&format!("s{}", i), ["A", "B", "C"][i % 3], s))
            .collect();
        let profile = ReportProfile::new(ReportKind::Attendance);

        let result = aggregate(&records, &AggregateParams::new(&profile, "院系"));
        for group in &result.groups {
            assert_eq!(
                group.positive_count + group.negative_count,
                group.total_count
            );
            assert!((0.0..=100.0).contains(&group.rate));
            assert!(group.total_count > 0);
        }
    }

    #[test]
    fn test_pin_to_top_regardless_of_direction() {
        let records = vec![
            attendance("a1", "A", "已签"),
            attendance("a2", "A", "缺勤"),
            attendance("b1", "B", "已签"),
            attendance("c1", "C", "缺勤"),
            attendance("d1", "D", "教师代签"),
        ];
        let profile = ReportProfile::new(ReportKind::Attendance);
        let mut params = AggregateParams::new(&profile, "院系");
        params.direction = SortDirection::Ascending;

        let result = aggregate(&records, &params);
        let order: Vec<&str> = result.groups.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(order, vec!["B", "D", "C", "A"]);

        let first_imperfect = result
            .groups
            .iter()
            .position(|g| g.rate < 100.0)
            .unwrap();
        assert!(result.groups[first_imperfect..]
            .iter()
            .all(|g| g.rate < 100.0));
    }

    #[test]
    fn test_missing_dimension_is_dropped() {
        let mut orphan = attendance("孤儿", "A", "已签");
        orphan.insert("院系", Value::Missing);
        let records = vec![attendance("张三", "A", "已签"), orphan];
        let profile = ReportProfile::new(ReportKind::Attendance);

        let result = aggregate(&records, &AggregateParams::new(&profile, "院系"));
        assert_eq!(result.dropped, 1);
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].total_count, 1);
    }

    #[test]
    fn test_missing_subject_still_counts() {
        let mut nameless = attendance("", "A", "缺勤");
        nameless.insert("姓名", Value::Missing);
        let records = vec![attendance("张三", "A", "已签"), nameless];
        let profile = ReportProfile::new(ReportKind::Attendance);
        let mut params = AggregateParams::new(&profile, "院系");
        params.show_negative = true;

        let result = aggregate(&records, &params);
        let a = find(&result.groups, "A");
        assert_eq!(a.total_count, 2);
        assert_eq!(a.negative_count, 1);
        assert_eq!(a.negative_names.as_deref(), Some("没有缺勤学生"));
    }

    #[test]
    fn test_negative_names_sorted_and_deduplicated() {
        let records = vec![
            attendance("王五", "A", "缺勤"),
            attendance("李四", "A", "缺勤"),
            attendance("王五", "A", "缺勤"),
            attendance("张三", "A", "已签"),
            attendance("赵六", "B", "缺勤"),
        ];
        let profile = ReportProfile::new(ReportKind::Attendance);

        let names = negative_names(&records, "院系", "A", &profile);
        let mut expected = vec!["李四", "王五"];
        expected.sort();
        assert_eq!(names, expected.join(", "));
    }

    #[test]
    fn test_negative_names_sentinel() {
        let records = vec![attendance("张三", "A", "已签")];
        let profile = ReportProfile::new(ReportKind::Attendance);
        assert_eq!(
            negative_names(&records, "院系", "A", &profile),
            "没有缺勤学生"
        );

        let task = ReportProfile::new(ReportKind::Task);
        assert_eq!(
            negative_names(&[], "院系", "A", &task),
            "所有学生都已经完成任务"
        );
    }

    #[test]
    fn test_names_only_when_requested() {
        let records = vec![attendance("李四", "A", "缺勤")];
        let profile = ReportProfile::new(ReportKind::Attendance);

        let result = aggregate(&records, &AggregateParams::new(&profile, "院系"));
        assert!(result.groups[0].negative_names.is_none());
    }

    #[test]
    fn test_idempotent() {
        let records = vec![
            attendance("a", "A", "已签"),
            attendance("b", "B", "缺勤"),
            attendance("c", "C", "已签"),
            attendance("d", "C", "缺勤"),
        ];
        let profile = ReportProfile::new(ReportKind::Attendance);
        let mut params = AggregateParams::new(&profile, "院系");
        params.show_negative = true;

        let first = aggregate(&records, &params);
        let second = aggregate(&records, &params);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.groups).unwrap(),
            serde_json::to_string(&second.groups).unwrap()
        );
    }

    #[test]
    fn test_watch_stats() {
        let records = vec![
            watch("a", "1班", Value::Number(30.0)),
            watch("b", "1班", Value::Number(0.0)),
            watch("c", "1班", Value::Missing),
            watch("d", "1班", text("坏数据")),
            watch("e", "2班", Value::Number(10.0)),
        ];
        let profile = ReportProfile::new(ReportKind::Watch);
        let mut params = AggregateParams::new(&profile, "授课班级");
        params.show_negative = true;

        let result = aggregate(&records, &params);
        assert_eq!(result.groups[0].group, "2班");

        let one = find(&result.groups, "1班");
        assert_eq!(one.total_count, 4);
        assert_eq!(one.positive_count, 1);
        assert_eq!(one.negative_count, 3);
        assert_eq!(one.rate, 25.0);
        let stats = one.watch.as_ref().unwrap();
        assert_eq!(stats.total_duration, 30.0);
        assert_eq!(stats.mean, 7.5);
        assert_eq!(stats.mean_display, "7.50");
        assert_eq!(stats.max, 30.0);
        assert_eq!(stats.min, 0.0);
        assert_eq!(one.negative_names.as_deref(), Some("b, c, d"));

        let two = find(&result.groups, "2班");
        assert_eq!(two.watch.as_ref().unwrap().mean, 10.0);
        assert_eq!(two.negative_names.as_deref(), Some("没有未观看学生"));
    }

    #[test]
    fn test_watch_sorted_by_mean_ascending() {
        let records = vec![
            watch("a", "1班", Value::Number(30.0)),
            watch("b", "2班", Value::Number(10.0)),
            watch("c", "3班", Value::Number(20.0)),
        ];
        let profile = ReportProfile::new(ReportKind::Watch);
        let mut params = AggregateParams::new(&profile, "授课班级");
        params.direction = SortDirection::Ascending;

        let result = aggregate(&records, &params);
        let order: Vec<&str> = result.groups.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(order, vec!["2班", "3班", "1班"]);
    }

    #[test]
    fn test_quiz_does_not_pin() {
        let quiz = |name: &str, dept: &str, status: &str| {
            Record::from_pairs([
                ("姓名", text(name)),
                ("院系", text(dept)),
                ("答题情况", text(status)),
            ])
        };
        let records = vec![
            quiz("a", "A", "正确"),
            quiz("b", "B", "正确"),
            quiz("c", "B", "错误"),
        ];
        let profile = ReportProfile::new(ReportKind::Quiz);
        let mut params = AggregateParams::new(&profile, "院系");
        params.direction = SortDirection::Ascending;

        let result = aggregate(&records, &params);
        let order: Vec<&str> = result.groups.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(order, vec!["B", "A"]);
    }

    #[test]
    fn test_task_pins_completed_groups_first() {
        let task = |name: &str, dept: &str, status: &str| {
            Record::from_pairs([
                ("姓名", text(name)),
                ("院系", text(dept)),
                ("完成情况", text(status)),
            ])
        };
        let records = vec![
            task("a1", "A", "已完成"),
            task("a2", "A", "未完成"),
            task("b1", "B", "未完成"),
            task("c1", "C", "已完成"),
            task("c2", "C", "已完成"),
        ];
        let profile = ReportProfile::new(ReportKind::Task);
        let mut params = AggregateParams::new(&profile, "院系");
        params.direction = SortDirection::Ascending;

        let result = aggregate(&records, &params);
        let order: Vec<&str> = result.groups.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(order, vec!["C", "B", "A"]);
        assert_eq!(result.groups[0].rate_display, "100.00");
    }

    #[test]
    fn test_score_groups_carry_stats_and_absent_names() {
        let score = |name: &str, value: Value| {
            Record::from_pairs([
                ("姓名", text(name)),
                ("院系", text("A")),
                ("成绩", value),
            ])
        };
        let records = vec![
            score("a", Value::Number(55.0)),
            score("b", Value::Number(60.0)),
            score("c", Value::Number(72.0)),
            score("d", Value::Number(100.0)),
            score("e", text("缺考")),
        ];
        let profile = ReportProfile::new(ReportKind::Score);
        let mut params = AggregateParams::new(&profile, "院系");
        params.show_negative = true;

        let result = aggregate(&records, &params);
        let a = &result.groups[0];
        assert_eq!(a.total_count, 5);
        assert_eq!(a.positive_count, 4);
        assert_eq!(a.negative_count, 1);
        let stats = a.scores.as_ref().unwrap();
        assert_eq!(stats.examined, 4);
        assert_eq!(stats.absent, 1);
        assert_eq!(stats.pass, 3);
        assert_eq!(stats.mean, 71.75);
        assert_eq!(a.negative_names.as_deref(), Some("e"));
    }

    #[test]
    fn test_numeric_dimension_values_group_together() {
        let record = |name: &str, class: Value| {
            Record::from_pairs([
                ("姓名", text(name)),
                ("行政班级", class),
                ("签到状态", text("已签")),
            ])
        };
        let records = vec![
            record("a", Value::Number(2101.0)),
            record("b", text("2101")),
        ];
        let profile = ReportProfile::new(ReportKind::Attendance);

        let result = aggregate(&records, &AggregateParams::new(&profile, "行政班级"));
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].total_count, 2);
    }
}
