//! Client-side record matching against the active filter list.
//!
//! Records are JSON work items; each known filter id maps to a fixed path
//! describing how to navigate a record down to the comparable value.

use serde_json::Value;

use crate::session::ActiveFilter;

/// One navigation step of an attribute path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep {
    /// Descend into a named field, which must be present and truthy.
    Descend(&'static str),
    /// The current value must be an array; the filter is satisfied when
    /// some element's named sub-field equals the filter value.
    ExistsMatch(&'static str),
}

use PathStep::{Descend, ExistsMatch};

/// How each known filter id navigates a work item. To support a new filter,
/// only this table needs a row.
pub fn attribute_path(id: &str) -> Option<&'static [PathStep]> {
    match id {
        "assignee" => Some(&[
            Descend("relationships"),
            Descend("assignees"),
            Descend("data"),
            ExistsMatch("id"),
        ]),
        "area" => Some(&[
            Descend("relationships"),
            Descend("area"),
            Descend("data"),
            Descend("id"),
        ]),
        "workitemtype" => Some(&[
            Descend("relationships"),
            Descend("baseType"),
            Descend("data"),
            Descend("id"),
        ]),
        "iteration" => Some(&[
            Descend("relationships"),
            Descend("iteration"),
            Descend("data"),
            Descend("id"),
        ]),
        _ => None,
    }
}

/// Whether a record satisfies every active filter. Filters whose id has no
/// attribute path are satisfied vacuously.
pub fn matches(record: &Value, filters: &[ActiveFilter]) -> bool {
    filters.iter().all(|filter| matches_one(record, filter))
}

fn matches_one(record: &Value, filter: &ActiveFilter) -> bool {
    let Some(path) = attribute_path(&filter.id) else {
        return true;
    };
    let mut current = record;
    for (index, step) in path.iter().enumerate() {
        match step {
            PathStep::ExistsMatch(subfield) => {
                let Some(items) = current.as_array() else {
                    return false;
                };
                return items.iter().any(|item| {
                    item.get(*subfield)
                        .is_some_and(|value| value_eq(value, &filter.value))
                });
            }
            PathStep::Descend(field) => match current.get(*field) {
                Some(next) if is_truthy(next) => {
                    current = next;
                    if index == path.len() - 1 && !value_eq(current, &filter.value) {
                        return false;
                    }
                }
                _ => return false,
            },
        }
    }
    true
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// String-wise comparison between a record value and a filter value;
/// numbers and booleans compare via their canonical rendering.
fn value_eq(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(text) => text == expected,
        Value::Number(number) => number.to_string() == expected,
        Value::Bool(flag) => flag.to_string() == expected,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(id: &str, value: &str) -> ActiveFilter {
        ActiveFilter {
            id: id.to_string(),
            param_key: format!("filter[{id}]"),
            value: value.to_string(),
        }
    }

    fn work_item() -> Value {
        json!({
            "id": "wi-1",
            "relationships": {
                "assignees": { "data": [ { "id": "42" }, { "id": "7" } ] },
                "area": { "data": { "id": "planner" } },
                "baseType": { "data": { "id": "bug" } },
                "iteration": { "data": { "id": "it1" } }
            }
        })
    }

    #[test]
    fn test_unknown_filter_id_is_vacuously_true() {
        assert!(matches(&work_item(), &[filter("unknown", "x")]));
    }

    #[test]
    fn test_empty_filter_list_matches_everything() {
        assert!(matches(&json!({}), &[]));
    }

    #[test]
    fn test_plain_descent_equality() {
        assert!(matches(&work_item(), &[filter("area", "planner")]));
        assert!(!matches(&work_item(), &[filter("area", "ui")]));
    }

    #[test]
    fn test_assignee_matches_existentially() {
        // "7" is one assignee among others
        assert!(matches(&work_item(), &[filter("assignee", "7")]));
        assert!(matches(&work_item(), &[filter("assignee", "42")]));
        assert!(!matches(&work_item(), &[filter("assignee", "99")]));
    }

    #[test]
    fn test_assignee_requires_an_array() {
        let record = json!({
            "relationships": { "assignees": { "data": { "id": "7" } } }
        });
        assert!(!matches(&record, &[filter("assignee", "7")]));
    }

    #[test]
    fn test_missing_intermediate_field_fails() {
        let record = json!({ "relationships": { "area": {} } });
        assert!(!matches(&record, &[filter("area", "planner")]));
        assert!(!matches(&json!({}), &[filter("iteration", "it1")]));
    }

    #[test]
    fn test_all_filters_must_match() {
        let filters = [filter("area", "planner"), filter("workitemtype", "task")];
        assert!(!matches(&work_item(), &filters));

        let filters = [
            filter("area", "planner"),
            filter("workitemtype", "bug"),
            filter("assignee", "42"),
            filter("unknown", "anything"),
        ];
        assert!(matches(&work_item(), &filters));
    }

    #[test]
    fn test_numbers_compare_string_wise() {
        let record = json!({
            "relationships": {
                "assignees": { "data": [ { "id": 42 } ] },
                "iteration": { "data": { "id": 3 } }
            }
        });
        assert!(matches(&record, &[filter("assignee", "42")]));
        assert!(matches(&record, &[filter("iteration", "3")]));
        assert!(!matches(&record, &[filter("iteration", "4")]));
    }
}
