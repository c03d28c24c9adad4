//! Report kinds and their classification rules.
//!
//! Every dashboard has the same shape; what differs is which column holds
//! the outcome, how a raw outcome maps to positive/negative, and a handful
//! of display and sorting details. A [`ReportProfile`] carries all of that
//! so the aggregator stays generic.

use crate::models::{Outcome, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default subject (person name) column.
pub const SUBJECT_FIELD: &str = "姓名";

/// Default course column.
pub const COURSE_FIELD: &str = "课程";

/// Default dimensions offered for grouping, in display order.
pub const DIMENSIONS: [&str; 6] = ["学校", "院系", "专业", "行政班级", "授课班级", "教师"];

/// Default pass mark for score reports.
pub const PASS_MARK: f64 = 60.0;

/// Default marker for a missed exam.
pub const ABSENT_MARKER: &str = "缺考";

/// The five report kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// Sign-in records.
    Attendance,
    /// Knowledge-point answers.
    Quiz,
    /// Audio/video watch logs.
    Watch,
    /// Assignment completion records.
    Task,
    /// Homework or exam scores.
    Score,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::Attendance => write!(f, "attendance"),
            ReportKind::Quiz => write!(f, "quiz"),
            ReportKind::Watch => write!(f, "watch"),
            ReportKind::Task => write!(f, "task"),
            ReportKind::Score => write!(f, "score"),
        }
    }
}

impl ReportKind {
    /// Human-readable report title.
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Attendance => "签到详情统计",
            ReportKind::Quiz => "知识点答题统计",
            ReportKind::Watch => "音视频观看详情",
            ReportKind::Task => "任务完成情况",
            ReportKind::Score => "成绩统计",
        }
    }

    /// Column holding the raw outcome.
    pub fn outcome_field(&self) -> &'static str {
        match self {
            ReportKind::Attendance => "签到状态",
            ReportKind::Quiz => "答题情况",
            ReportKind::Watch => "观看时长",
            ReportKind::Task => "完成情况",
            ReportKind::Score => "成绩",
        }
    }

    /// Filter that must keep at least one selected value.
    pub fn required_filter(&self) -> Option<&'static str> {
        match self {
            ReportKind::Attendance => Some("时间"),
            ReportKind::Watch => Some("视频"),
            _ => None,
        }
    }

    /// Dimension used when none is chosen.
    pub fn default_dimension(&self) -> &'static str {
        match self {
            ReportKind::Watch => "授课班级",
            _ => "院系",
        }
    }

    /// Text shown instead of an empty negative-name list.
    pub fn no_negative_sentinel(&self) -> &'static str {
        match self {
            ReportKind::Attendance => "没有缺勤学生",
            ReportKind::Quiz => "所有学生都已经答对",
            ReportKind::Watch => "没有未观看学生",
            ReportKind::Task => "所有学生都已经完成任务",
            ReportKind::Score => "没有缺考学生",
        }
    }

    /// Column labels for the positive/negative counts and the name list.
    pub fn labels(&self) -> OutcomeLabels {
        let (positive, negative, rate, names) = match self {
            ReportKind::Attendance => ("出勤人次", "缺勤人次", "出勤率", "缺勤学生"),
            ReportKind::Quiz => ("答对人次", "答错人次", "正确率", "答错学生"),
            ReportKind::Watch => ("已观看人次", "未观看人次", "观看率", "未观看名单"),
            ReportKind::Task => ("已完成人次", "未完成人次", "完成率", "未完成学生"),
            ReportKind::Score => ("实考人次", "缺考人次", "实考率", "缺考名单"),
        };
        OutcomeLabels {
            positive,
            negative,
            rate,
            names,
        }
    }

    /// Whether groups at 100% are pinned ahead of everything else.
    pub fn pins_perfect(&self) -> bool {
        matches!(self, ReportKind::Attendance | ReportKind::Task)
    }

    /// Sort metrics this kind offers; the first is the default.
    pub fn metrics(&self) -> &'static [SortMetric] {
        match self {
            ReportKind::Attendance | ReportKind::Quiz | ReportKind::Task => {
                &[SortMetric::Rate, SortMetric::Total]
            }
            ReportKind::Watch => &[
                SortMetric::Mean,
                SortMetric::Max,
                SortMetric::Min,
                SortMetric::Rate,
                SortMetric::Total,
            ],
            ReportKind::Score => &[
                SortMetric::Mean,
                SortMetric::PassRate,
                SortMetric::Max,
                SortMetric::Min,
                SortMetric::Rate,
                SortMetric::Total,
            ],
        }
    }

    /// The metric used when none is chosen.
    pub fn default_metric(&self) -> SortMetric {
        self.metrics()[0]
    }

    /// Classification rule with default status strings.
    pub fn default_rule(&self) -> ClassificationRule {
        match self {
            ReportKind::Attendance => {
                ClassificationRule::OneOf(vec!["已签".to_string(), "教师代签".to_string()])
            }
            ReportKind::Quiz => ClassificationRule::Equals("正确".to_string()),
            ReportKind::Watch => ClassificationRule::PositiveNumber,
            ReportKind::Task => ClassificationRule::Equals("已完成".to_string()),
            ReportKind::Score => ClassificationRule::Examined {
                absent_marker: ABSENT_MARKER.to_string(),
            },
        }
    }
}

/// Column labels for a report kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeLabels {
    pub positive: &'static str,
    pub negative: &'static str,
    pub rate: &'static str,
    pub names: &'static str,
}

/// Maps a raw outcome cell onto [`Outcome`].
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationRule {
    /// Positive when the text is one of the listed statuses.
    OneOf(Vec<String>),
    /// Positive when the text equals the status exactly.
    Equals(String),
    /// Positive when the cell reads as a number greater than zero.
    PositiveNumber,
    /// Positive when the cell reads as a number; missing cells and the
    /// absence marker are negative.
    Examined { absent_marker: String },
}

impl ClassificationRule {
    /// Classify one raw cell. Total over every possible value.
    pub fn classify(&self, value: &Value) -> Outcome {
        match self {
            ClassificationRule::OneOf(statuses) => Outcome::from_bool(
                value
                    .key()
                    .is_some_and(|raw| statuses.iter().any(|s| *s == raw)),
            ),
            ClassificationRule::Equals(status) => {
                Outcome::from_bool(value.key().is_some_and(|raw| raw == *status))
            }
            ClassificationRule::PositiveNumber => {
                Outcome::from_bool(value.as_number().is_some_and(|n| n > 0.0))
            }
            ClassificationRule::Examined { absent_marker } => {
                if value.key().as_deref() == Some(absent_marker.as_str()) {
                    return Outcome::Negative;
                }
                Outcome::from_bool(value.as_number().is_some())
            }
        }
    }
}

/// Metric a report is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMetric {
    /// Positive rate.
    Rate,
    /// Mean watch time or mean score.
    Mean,
    /// Pass rate among examined records.
    PassRate,
    Max,
    Min,
    /// Record count.
    Total,
}

impl fmt::Display for SortMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortMetric::Rate => write!(f, "rate"),
            SortMetric::Mean => write!(f, "mean"),
            SortMetric::PassRate => write!(f, "pass-rate"),
            SortMetric::Max => write!(f, "max"),
            SortMetric::Min => write!(f, "min"),
            SortMetric::Total => write!(f, "total"),
        }
    }
}

/// Sort direction chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Everything the aggregator needs to know about one report kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportProfile {
    pub kind: ReportKind,
    /// Column holding the person name.
    pub subject_field: String,
    /// Column holding the raw outcome.
    pub outcome_field: String,
    pub rule: ClassificationRule,
    /// Pass mark for score reports.
    pub pass_mark: f64,
    /// Text used when a group has no negative subjects.
    pub sentinel: String,
}

impl ReportProfile {
    /// Profile with the default column names of a kind.
    pub fn new(kind: ReportKind) -> Self {
        Self {
            kind,
            subject_field: SUBJECT_FIELD.to_string(),
            outcome_field: kind.outcome_field().to_string(),
            rule: kind.default_rule(),
            pass_mark: PASS_MARK,
            sentinel: kind.no_negative_sentinel().to_string(),
        }
    }

    /// Classify a record's outcome cell.
    pub fn classify(&self, value: &Value) -> Outcome {
        self.rule.classify(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_attendance_rule() {
        let rule = ReportKind::Attendance.default_rule();
        assert_eq!(rule.classify(&text("已签")), Outcome::Positive);
        assert_eq!(rule.classify(&text("教师代签")), Outcome::Positive);
        assert_eq!(rule.classify(&text("缺勤")), Outcome::Negative);
        assert_eq!(rule.classify(&text("事假")), Outcome::Negative);
        assert_eq!(rule.classify(&Value::Missing), Outcome::Negative);
    }

    #[test]
    fn test_quiz_and_task_rules() {
        let quiz = ReportKind::Quiz.default_rule();
        assert_eq!(quiz.classify(&text("正确")), Outcome::Positive);
        assert_eq!(quiz.classify(&text("错误")), Outcome::Negative);
        assert_eq!(quiz.classify(&Value::Missing), Outcome::Negative);

        let task = ReportKind::Task.default_rule();
        assert_eq!(task.classify(&text("已完成")), Outcome::Positive);
        assert_eq!(task.classify(&text("未完成")), Outcome::Negative);
    }

    #[test]
    fn test_watch_rule() {
        let rule = ReportKind::Watch.default_rule();
        assert_eq!(rule.classify(&Value::Number(12.5)), Outcome::Positive);
        assert_eq!(rule.classify(&Value::Number(0.0)), Outcome::Negative);
        assert_eq!(rule.classify(&Value::Missing), Outcome::Negative);
        assert_eq!(rule.classify(&text("n/a")), Outcome::Negative);
    }

    #[test]
    fn test_score_rule() {
        let rule = ReportKind::Score.default_rule();
        assert_eq!(rule.classify(&Value::Number(0.0)), Outcome::Positive);
        assert_eq!(rule.classify(&Value::Number(55.0)), Outcome::Positive);
        assert_eq!(rule.classify(&text("缺考")), Outcome::Negative);
        assert_eq!(rule.classify(&Value::Missing), Outcome::Negative);
        assert_eq!(rule.classify(&text("作弊")), Outcome::Negative);
    }

    #[test]
    fn test_numeric_absent_marker() {
        let rule = ClassificationRule::Examined {
            absent_marker: "-1".to_string(),
        };
        assert_eq!(rule.classify(&Value::Number(-1.0)), Outcome::Negative);
        assert_eq!(rule.classify(&Value::Number(80.0)), Outcome::Positive);
    }

    #[test]
    fn test_numeric_status_matches_by_key() {
        let rule = ClassificationRule::Equals("1".to_string());
        assert_eq!(rule.classify(&Value::Number(1.0)), Outcome::Positive);
    }

    #[test]
    fn test_pin_policy() {
        assert!(ReportKind::Attendance.pins_perfect());
        assert!(ReportKind::Task.pins_perfect());
        assert!(!ReportKind::Quiz.pins_perfect());
        assert!(!ReportKind::Watch.pins_perfect());
        assert!(!ReportKind::Score.pins_perfect());
    }

    #[test]
    fn test_default_metrics() {
        assert_eq!(ReportKind::Attendance.default_metric(), SortMetric::Rate);
        assert_eq!(ReportKind::Watch.default_metric(), SortMetric::Mean);
        assert_eq!(ReportKind::Score.default_metric(), SortMetric::Mean);
        assert!(!ReportKind::Quiz.metrics().contains(&SortMetric::Mean));
    }
}
