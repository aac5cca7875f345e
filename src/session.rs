//! The session-scoped active filter list.
//!
//! Active filters are the flat, tree-independent representation used for
//! in-memory record matching and for the `filter[<id>]` transport
//! parameters. The expression tree for the textual query round trip is
//! maintained separately by callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::matcher;

/// A single applied filter, keyed by unique id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveFilter {
    pub id: String,
    pub param_key: String,
    pub value: String,
}

/// Ordered set of currently applied filters, at most one entry per id.
#[derive(Debug, Clone, Default)]
pub struct FilterSession {
    active_filters: Vec<ActiveFilter>,
}

impl FilterSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a filter value. An existing entry with the same id is
    /// overwritten in place, keeping its position; a new id is appended.
    pub fn set_filter_value(&mut self, id: &str, value: &str) {
        let param_key = format!("filter[{id}]");
        if let Some(entry) = self.active_filters.iter_mut().find(|f| f.id == id) {
            entry.param_key = param_key;
            entry.value = value.to_string();
        } else {
            self.active_filters.push(ActiveFilter {
                id: id.to_string(),
                param_key,
                value: value.to_string(),
            });
        }
    }

    pub fn get_filter_value(&self, id: &str) -> Option<&str> {
        self.active_filters
            .iter()
            .find(|f| f.id == id)
            .map(|f| f.value.as_str())
    }

    pub fn applied_filters(&self) -> &[ActiveFilter] {
        &self.active_filters
    }

    /// Remove the filters with the listed ids, or every filter when `ids`
    /// is empty.
    pub fn clear_filters(&mut self, ids: &[&str]) {
        if ids.is_empty() {
            self.active_filters.clear();
        } else {
            self.active_filters
                .retain(|f| !ids.contains(&f.id.as_str()));
        }
    }

    /// `filter[<id>]=<value>` pairs for the transport layer.
    pub fn query_params(&self) -> Vec<(String, String)> {
        self.active_filters
            .iter()
            .map(|f| (f.param_key.clone(), f.value.clone()))
            .collect()
    }

    /// Whether a record satisfies every applied filter.
    pub fn matches(&self, record: &Value) -> bool {
        matcher::matches(record, &self.active_filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_appends_and_derives_param_key() {
        let mut session = FilterSession::new();
        session.set_filter_value("area", "planner");
        session.set_filter_value("assignee", "42");

        let filters = session.applied_filters();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].param_key, "filter[area]");
        assert_eq!(filters[1].param_key, "filter[assignee]");
    }

    #[test]
    fn test_set_overwrites_in_place() {
        let mut session = FilterSession::new();
        session.set_filter_value("area", "planner");
        session.set_filter_value("assignee", "42");
        session.set_filter_value("area", "ui");

        let filters = session.applied_filters();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].id, "area");
        assert_eq!(filters[0].value, "ui");
        assert_eq!(session.get_filter_value("area"), Some("ui"));
        assert_eq!(session.get_filter_value("iteration"), None);
    }

    #[test]
    fn test_clear_by_subset_and_wholesale() {
        let mut session = FilterSession::new();
        session.set_filter_value("area", "planner");
        session.set_filter_value("assignee", "42");
        session.set_filter_value("iteration", "it1");

        session.clear_filters(&["area", "iteration"]);
        let remaining: Vec<_> = session.applied_filters().iter().map(|f| &f.id).collect();
        assert_eq!(remaining, ["assignee"]);

        session.clear_filters(&[]);
        assert!(session.applied_filters().is_empty());
    }

    #[test]
    fn test_query_params() {
        let mut session = FilterSession::new();
        session.set_filter_value("workitemtype", "bug");
        session.set_filter_value("iteration", "it1");
        assert_eq!(
            session.query_params(),
            vec![
                ("filter[workitemtype]".to_string(), "bug".to_string()),
                ("filter[iteration]".to_string(), "it1".to_string()),
            ]
        );
    }

    #[test]
    fn test_matches_delegates_to_the_matcher() {
        let record = json!({
            "relationships": {
                "baseType": { "data": { "id": "bug" } }
            }
        });
        let mut session = FilterSession::new();
        session.set_filter_value("workitemtype", "bug");
        assert!(session.matches(&record));
        session.set_filter_value("workitemtype", "task");
        assert!(!session.matches(&record));
    }
}
