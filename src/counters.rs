//! The counters aggregate: host → service → metric → time-series.

use std::collections::BTreeMap;

use serde::Serialize;

/// A metric time-series: `(timestamp, value)` pairs in discovery order.
pub type Series = Vec<(i64, f64)>;

/// Three-level aggregate of extracted counter observations.
///
/// Intermediate levels are created lazily on first insert. Observations are
/// appended as they arrive, with no deduplication and no re-sorting, since
/// the fetch queries already deliver records sorted by descending last-check.
/// Serializes transparently as the nested JSON object the tool prints.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Counters {
    inner: BTreeMap<String, BTreeMap<String, BTreeMap<String, Series>>>,
}

impl Counters {
    /// Create an empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one observation, creating intermediate levels on demand.
    pub fn insert(&mut self, host: &str, service: &str, metric: &str, timestamp: i64, value: f64) {
        self.inner
            .entry(host.to_string())
            .or_default()
            .entry(service.to_string())
            .or_default()
            .entry(metric.to_string())
            .or_default()
            .push((timestamp, value));
    }

    /// Whether any observation was collected.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of hosts with at least one observation.
    pub fn host_count(&self) -> usize {
        self.inner.len()
    }

    /// The series for one (host, service, metric) triple, if present.
    pub fn series(&self, host: &str, service: &str, metric: &str) -> Option<&Series> {
        self.inner.get(host)?.get(service)?.get(metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn levels_are_created_lazily() {
        let mut counters = Counters::new();
        assert!(counters.is_empty());

        counters.insert("localhost", "PING", "rta", 100, 0.5);
        assert!(!counters.is_empty());
        assert_eq!(counters.host_count(), 1);
        assert_eq!(counters.series("localhost", "PING", "rta").unwrap(), &[(100, 0.5)]);
        assert!(counters.series("localhost", "PING", "pl").is_none());
        assert!(counters.series("other", "PING", "rta").is_none());
    }

    #[test]
    fn observations_append_in_discovery_order() {
        let mut counters = Counters::new();
        counters.insert("h", "s", "m", 300, 3.0);
        counters.insert("h", "s", "m", 200, 2.0);
        counters.insert("h", "s", "m", 100, 1.0);

        assert_eq!(
            counters.series("h", "s", "m").unwrap(),
            &[(300, 3.0), (200, 2.0), (100, 1.0)]
        );
    }

    #[test]
    fn repeated_insert_doubles_the_series() {
        let mut counters = Counters::new();
        for _ in 0..2 {
            counters.insert("h", "s", "m", 100, 1.0);
            counters.insert("h", "s", "m", 200, 2.0);
        }
        assert_eq!(counters.series("h", "s", "m").unwrap().len(), 4);
    }

    #[test]
    fn empty_service_name_is_a_valid_key() {
        let mut counters = Counters::new();
        counters.insert("gateway", "", "uptime", 100, 42.0);
        assert_eq!(counters.series("gateway", "", "uptime").unwrap(), &[(100, 42.0)]);
    }

    #[test]
    fn serializes_as_nested_object_with_pair_arrays() {
        let mut counters = Counters::new();
        counters.insert("localhost", "PING", "rta", 100, 0.5);
        counters.insert("localhost", "PING", "pl", 100, 0.0);

        let value = serde_json::to_value(&counters).unwrap();
        assert_eq!(
            value,
            json!({"localhost": {"PING": {"pl": [[100, 0.0]], "rta": [[100, 0.5]]}}})
        );
    }
}
