//! Multi-select filtering and the dimension list.
//!
//! A field with no selection keeps every value. An explicitly empty
//! selection is an error on the report's required filter, and switches
//! course filtering off (removing the course dimension) on the course field.

use crate::error::{ReportError, Result};
use crate::models::Record;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Values chosen for one field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every value is kept.
    #[default]
    All,
    /// Only the listed values are kept. May be empty.
    Only(BTreeSet<String>),
}

impl Selection {
    /// Returns true when the user deselected everything.
    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::Only(values) if values.is_empty())
    }

    /// Whether a grouping key passes this selection.
    pub fn accepts(&self, key: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(values) => key.is_some_and(|k| values.contains(k)),
        }
    }
}

/// Selections keyed by field name.
#[derive(Debug, Clone, Default)]
pub struct Selections {
    by_field: BTreeMap<String, Selection>,
}

impl Selections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict a field to the given values.
    pub fn select<I, S>(&mut self, field: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.by_field.insert(field.into(), Selection::Only(values));
    }

    /// Selection for a field, `All` when none was made.
    pub fn get(&self, field: &str) -> &Selection {
        static ALL: Selection = Selection::All;
        self.by_field.get(field).unwrap_or(&ALL)
    }

    /// Iterate over the explicit selections.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Selection)> {
        self.by_field.iter()
    }
}

/// Apply selections to a record set.
///
/// Records missing the required filter field are always dropped. The input
/// is left untouched.
pub fn apply_selections(
    records: &[Record],
    selections: &Selections,
    required_filter: Option<&str>,
    course_field: &str,
) -> Result<Vec<Record>> {
    if let Some(field) = required_filter {
        if selections.get(field).is_empty() {
            return Err(ReportError::EmptySelection(field.to_string()));
        }
    }

    for (field, selection) in selections.iter() {
        if selection.is_empty() && field != course_field {
            return Err(ReportError::EmptySelection(field.clone()));
        }
    }

    let selected: Vec<Record> = records
        .iter()
        .filter(|record| {
            if let Some(field) = required_filter {
                if record.key(field).is_none() {
                    return false;
                }
            }

            selections.iter().all(|(field, selection)| {
                if field == course_field && selection.is_empty() {
                    return true;
                }
                selection.accepts(record.key(field).as_deref())
            })
        })
        .cloned()
        .collect();

    debug!(
        "Selections kept {} of {} records",
        selected.len(),
        records.len()
    );

    Ok(selected)
}

/// Dimensions the user may group by.
///
/// The course field is appended unless the course selection was emptied.
pub fn available_dimensions(
    base: &[String],
    course_field: &str,
    selections: &Selections,
) -> Vec<String> {
    let mut dimensions = base.to_vec();
    if !selections.get(course_field).is_empty() && !dimensions.iter().any(|d| d == course_field)
    {
        dimensions.push(course_field.to_string());
    }
    dimensions
}

/// Validate a requested dimension, falling back to the default.
pub fn resolve_dimension(
    requested: Option<&str>,
    default: &str,
    available: &[String],
) -> Result<String> {
    let dimension = requested.unwrap_or(default);

    if available.iter().any(|d| d == dimension) {
        Ok(dimension.to_string())
    } else {
        Err(ReportError::UnknownDimension {
            dimension: dimension.to_string(),
            available: available.join(", "),
        })
    }
}

/// Distinct non-missing values of a field, sorted.
pub fn distinct_values(records: &[Record], field: &str) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.key(field))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    fn record(date: Option<&str>, course: &str) -> Record {
        let mut r = Record::new();
        if let Some(d) = date {
            r.insert("时间", Value::Text(d.to_string()));
        }
        r.insert("课程", Value::Text(course.to_string()));
        r.insert("院系", Value::Text("A".to_string()));
        r
    }

    fn base_dimensions() -> Vec<String> {
        vec!["院系".to_string(), "教师".to_string()]
    }

    #[test]
    fn test_no_selection_keeps_everything_with_required_field() {
        let records = vec![
            record(Some("2024-03-01"), "数学"),
            record(None, "数学"),
            record(Some("2024-03-02"), "英语"),
        ];

        let selected =
            apply_selections(&records, &Selections::new(), Some("时间"), "课程").unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_only_selection_filters() {
        let records = vec![
            record(Some("2024-03-01"), "数学"),
            record(Some("2024-03-01"), "英语"),
            record(Some("2024-03-02"), "英语"),
        ];
        let mut selections = Selections::new();
        selections.select("时间", ["2024-03-01"]);
        selections.select("课程", ["英语"]);

        let selected = apply_selections(&records, &selections, Some("时间"), "课程").unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].key("课程").as_deref(), Some("英语"));
    }

    #[test]
    fn test_empty_required_selection_is_an_error() {
        let records = vec![record(Some("2024-03-01"), "数学")];
        let mut selections = Selections::new();
        selections.select("时间", Vec::<String>::new());

        let err = apply_selections(&records, &selections, Some("时间"), "课程").unwrap_err();
        assert!(matches!(err, ReportError::EmptySelection(field) if field == "时间"));
    }

    #[test]
    fn test_empty_course_selection_disables_course_filter() {
        let records = vec![
            record(Some("2024-03-01"), "数学"),
            record(Some("2024-03-01"), "英语"),
        ];
        let mut selections = Selections::new();
        selections.select("课程", Vec::<String>::new());

        let selected = apply_selections(&records, &selections, Some("时间"), "课程").unwrap();
        assert_eq!(selected.len(), 2);

        let dims = available_dimensions(&base_dimensions(), "课程", &selections);
        assert!(!dims.contains(&"课程".to_string()));
    }

    #[test]
    fn test_course_dimension_offered_by_default() {
        let dims = available_dimensions(&base_dimensions(), "课程", &Selections::new());
        assert_eq!(dims.last().map(String::as_str), Some("课程"));
    }

    #[test]
    fn test_resolve_dimension() {
        let dims = base_dimensions();
        assert_eq!(resolve_dimension(None, "院系", &dims).unwrap(), "院系");
        assert_eq!(resolve_dimension(Some("教师"), "院系", &dims).unwrap(), "教师");
        assert!(matches!(
            resolve_dimension(Some("课程"), "院系", &dims),
            Err(ReportError::UnknownDimension { .. })
        ));
    }

    #[test]
    fn test_distinct_values() {
        let records = vec![
            record(Some("2024-03-02"), "数学"),
            record(Some("2024-03-01"), "数学"),
            record(None, "英语"),
        ];
        assert_eq!(
            distinct_values(&records, "时间"),
            vec!["2024-03-01".to_string(), "2024-03-02".to_string()]
        );
    }
}
