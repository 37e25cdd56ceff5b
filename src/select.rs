//! Selection criteria and backend filter construction.
//!
//! Each of the three filter fields (hosts, services, metrics) is either the
//! `all` sentinel or an explicit name list. Host and service filtering is
//! pushed down to the backend as a `where` clause; metric filtering happens
//! in-process against parsed performance data.
//!
//! Match semantics are deliberately asymmetric and must stay that way:
//! a single host or service name matches as a substring (`$regex`), two or
//! more names match as exact set membership (`$in`), while metric names
//! always match by exact list membership, never as substrings.

use serde_json::{json, Value};

/// One filter field: everything, or an explicit name list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Select {
    /// The `all` sentinel: everything passes.
    All,
    /// An explicit, non-empty list of names.
    Names(Vec<String>),
}

impl Select {
    /// Parse a comma-separated list, with `all` as the sentinel.
    ///
    /// Empty fragments are dropped; a list with no remaining names degrades
    /// to [`Select::All`].
    pub fn parse(raw: &str) -> Self {
        if raw.trim() == "all" {
            return Select::All;
        }
        let names: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();
        if names.is_empty() {
            Select::All
        } else {
            Select::Names(names)
        }
    }

    /// Backend `where` clause for a name field, or `None` for [`Select::All`].
    pub fn clause(&self, field: &str) -> Option<Value> {
        match self {
            Select::All => None,
            Select::Names(names) if names.len() == 1 => {
                Some(json!({ field: { "$regex": format!(".*{}.*", names[0]) } }))
            }
            Select::Names(names) => Some(json!({ field: { "$in": names } })),
        }
    }

    /// Exact list membership, used for metric names.
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Select::All => true,
            Select::Names(names) => names.iter().any(|n| n == name),
        }
    }
}

/// The three filter fields of one extraction run.
#[derive(Debug, Clone)]
pub struct Selection {
    pub hosts: Select,
    pub services: Select,
    pub metrics: Select,
}

impl Selection {
    /// Parse the three CLI filter values.
    pub fn parse(hosts: &str, services: &str, metrics: &str) -> Self {
        Self {
            hosts: Select::parse(hosts),
            services: Select::parse(services),
            metrics: Select::parse(metrics),
        }
    }

    /// Combined `where` clause for check-result records in the bulk query.
    pub fn record_clause(&self) -> Option<Value> {
        let hosts = self.hosts.clause("host_name");
        let services = self.services.clause("service_name");
        match (hosts, services) {
            (Some(h), Some(s)) => Some(json!({ "$and": [h, s] })),
            (Some(clause), None) | (None, Some(clause)) => Some(clause),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_sentinel_passes_everything() {
        let select = Select::parse("all");
        assert_eq!(select, Select::All);
        assert!(select.clause("host_name").is_none());
        assert!(select.contains("anything"));
    }

    #[test]
    fn single_name_matches_as_substring() {
        let select = Select::parse("web");
        assert_eq!(
            select.clause("host_name"),
            Some(json!({"host_name": {"$regex": ".*web.*"}}))
        );
    }

    #[test]
    fn multiple_names_match_as_exact_set() {
        let select = Select::parse("web-01,web-02");
        assert_eq!(
            select.clause("host_name"),
            Some(json!({"host_name": {"$in": ["web-01", "web-02"]}}))
        );
    }

    #[test]
    fn metric_names_use_exact_membership_even_for_one_name() {
        let select = Select::parse("rta");
        assert!(select.contains("rta"));
        assert!(!select.contains("rta_max"));
        assert!(!select.contains("rt"));
    }

    #[test]
    fn list_whitespace_and_empty_fragments_are_dropped() {
        let select = Select::parse(" rta , pl ,,");
        assert_eq!(
            select,
            Select::Names(vec!["rta".to_string(), "pl".to_string()])
        );
        assert_eq!(Select::parse(",,"), Select::All);
        assert_eq!(Select::parse(""), Select::All);
    }

    #[test]
    fn record_clause_combines_host_and_service() {
        let selection = Selection::parse("web-01,web-02", "PING", "all");
        assert_eq!(
            selection.record_clause(),
            Some(json!({"$and": [
                {"host_name": {"$in": ["web-01", "web-02"]}},
                {"service_name": {"$regex": ".*PING.*"}}
            ]}))
        );
    }

    #[test]
    fn record_clause_with_one_filtered_field() {
        let selection = Selection::parse("all", "PING", "all");
        assert_eq!(
            selection.record_clause(),
            Some(json!({"service_name": {"$regex": ".*PING.*"}}))
        );
    }

    #[test]
    fn record_clause_absent_when_everything_selected() {
        assert!(Selection::parse("all", "all", "all").record_clause().is_none());
    }
}
