//! Extraction driver: fetch check results, parse, filter and aggregate.
//!
//! Two fetch strategies locate the same records:
//!
//! - [`QueryMode::Bulk`] issues one filtered query over the whole
//!   check-result log.
//! - [`QueryMode::PerEntity`] discovers matching hosts, then their matching
//!   services, then queries the log once per (host, service) pair.
//!
//! Both feed the same filter/aggregate pair. Soft failures (nothing matched
//! a query, one pair failed to fetch) are recorded in an instance-scoped
//! error log and never abort the remaining work; only a transport failure
//! of the single bulk query fails the whole run.

use chrono::FixedOffset;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::backend::{BackendSession, ResourceQuery};
use crate::counters::Counters;
use crate::date::format_timestamp;
use crate::error::BackendError;
use crate::perfdata::PerfData;
use crate::select::Selection;

/// How check-result records are located in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// One query over all check results, filtered server-side.
    Bulk,
    /// Discover hosts and services first, then query each pair.
    PerEntity,
}

/// One historical check result, as projected from the backend log.
#[derive(Debug, Deserialize)]
pub struct CheckResult {
    #[serde(default)]
    pub host_name: String,
    #[serde(default)]
    pub service_name: String,
    /// Seconds since epoch, UTC.
    #[serde(default)]
    pub last_check: i64,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub state_type: String,
    #[serde(default)]
    pub perf_data: String,
}

#[derive(Debug, Deserialize)]
struct HostItem {
    #[serde(rename = "_id")]
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ServiceItem {
    #[serde(rename = "_id")]
    id: String,
    name: String,
}

/// One extraction run: owns the session, the selection, the aggregate and
/// the error log.
#[derive(Debug)]
pub struct Extraction {
    session: BackendSession,
    selection: Selection,
    mode: QueryMode,
    display_offset: FixedOffset,
    counters: Counters,
    errors: Vec<String>,
}

impl Extraction {
    /// Create a run over an authenticated session.
    pub fn new(
        session: BackendSession,
        selection: Selection,
        mode: QueryMode,
        display_offset: FixedOffset,
    ) -> Self {
        Self {
            session,
            selection,
            mode,
            display_offset,
            counters: Counters::new(),
            errors: Vec::new(),
        }
    }

    /// Fetch and aggregate everything the selection matches.
    ///
    /// Returns `Err` only on a fatal transport failure; soft failures end
    /// up in [`Extraction::errors`].
    pub async fn run(&mut self) -> Result<(), BackendError> {
        match self.mode {
            QueryMode::Bulk => self.extract_bulk().await?,
            QueryMode::PerEntity => self.extract_per_entity().await?,
        }

        if self.counters.is_empty() && self.errors.is_empty() {
            self.errors
                .push("No performance data metrics matching the requested counters".to_string());
        }
        Ok(())
    }

    /// The aggregate collected so far.
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Soft failures recorded during the run.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Consume the run, yielding the aggregate and the error log.
    pub fn into_parts(self) -> (Counters, Vec<String>) {
        (self.counters, self.errors)
    }

    async fn extract_bulk(&mut self) -> Result<(), BackendError> {
        let mut query = ResourceQuery::new().sort("-last_check").projection(json!({
            "host_name": 1, "service_name": 1,
            "last_check": 1, "state": 1, "state_type": 1, "perf_data": 1,
        }));
        if let Some(clause) = self.selection.record_clause() {
            query = query.filter(clause);
        }

        let records: Vec<CheckResult> = self.session.get_all("logcheckresult", &query).await?;
        if records.is_empty() {
            warn!("no check results matched the search query");
            self.errors
                .push("No check results matching the search query".to_string());
            return Ok(());
        }

        info!("found {} matching check results", records.len());
        for record in &records {
            self.ingest(
                &record.host_name,
                &record.service_name,
                record.last_check,
                &record.perf_data,
            );
        }
        Ok(())
    }

    async fn extract_per_entity(&mut self) -> Result<(), BackendError> {
        let hosts = self.matching_hosts().await?;
        if hosts.is_empty() {
            self.errors.push("No matching hosts found".to_string());
            return Ok(());
        }
        info!("found {} matching hosts", hosts.len());

        for host in hosts {
            let services = match self.matching_services(&host.id).await {
                Ok(services) => services,
                Err(err) => {
                    self.errors
                        .push(format!("Listing services for {} failed: {}", host.name, err));
                    continue;
                }
            };
            if services.is_empty() {
                self.errors
                    .push(format!("No matching services found for host {}", host.name));
                continue;
            }
            debug!("host {}: {} matching services", host.name, services.len());

            for service in services {
                match self.service_check_results(&service.id).await {
                    Ok(records) if records.is_empty() => {
                        self.errors.push(format!(
                            "No check results matching {}/{}",
                            host.name, service.name
                        ));
                    }
                    Ok(records) => {
                        debug!(
                            "found {} check results for {}/{}",
                            records.len(),
                            host.name,
                            service.name
                        );
                        for record in &records {
                            self.ingest(
                                &host.name,
                                &service.name,
                                record.last_check,
                                &record.perf_data,
                            );
                        }
                    }
                    Err(err) => {
                        self.errors.push(format!(
                            "Fetching check results for {}/{} failed: {}",
                            host.name, service.name, err
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    async fn matching_hosts(&self) -> Result<Vec<HostItem>, BackendError> {
        let mut query = ResourceQuery::new()
            .sort("name")
            .projection(json!({"_id": 1, "name": 1}));
        if let Some(clause) = self.selection.hosts.clause("name") {
            query = query.filter(clause);
        }
        self.session.get_all("host", &query).await
    }

    async fn matching_services(&self, host_id: &str) -> Result<Vec<ServiceItem>, BackendError> {
        let host_clause = json!({"host": host_id});
        let filter = match self.selection.services.clause("name") {
            Some(name_clause) => json!({"$and": [host_clause, name_clause]}),
            None => host_clause,
        };
        let query = ResourceQuery::new()
            .sort("name")
            .filter(filter)
            .projection(json!({"_id": 1, "name": 1}));
        self.session.get_all("service", &query).await
    }

    async fn service_check_results(&self, service_id: &str) -> Result<Vec<CheckResult>, BackendError> {
        let query = ResourceQuery::new()
            .sort("-last_check")
            .filter(json!({"service": service_id}))
            .embedded(json!({"host": 1, "service": 1}))
            .projection(json!({"last_check": 1, "state": 1, "state_type": 1, "perf_data": 1}));
        self.session.get_all("logcheckresult", &query).await
    }

    fn ingest(&mut self, host: &str, service: &str, last_check: i64, perf_data: &str) {
        let date = format_timestamp(last_check, self.display_offset);
        for metric in &PerfData::parse(perf_data) {
            if self.selection.metrics.contains(&metric.name) {
                debug!("found: {} - {} = {}", date, metric.name, metric.value);
                self.counters
                    .insert(host, service, &metric.name, last_check, metric.value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn extraction(metrics: &str) -> Extraction {
        Extraction::new(
            BackendSession::builder().build(),
            Selection::parse("all", "all", metrics),
            QueryMode::Bulk,
            FixedOffset::east_opt(0).unwrap(),
        )
    }

    #[test]
    fn ingest_keeps_all_metrics_with_all_sentinel() {
        let mut run = extraction("all");
        run.ingest("localhost", "PING", 1000, "rta=0.5ms;100;500 pl=0%;20;60");

        assert_eq!(
            run.counters().series("localhost", "PING", "rta").unwrap(),
            &[(1000, 0.5)]
        );
        assert_eq!(
            run.counters().series("localhost", "PING", "pl").unwrap(),
            &[(1000, 0.0)]
        );
    }

    #[test]
    fn ingest_applies_exact_metric_filter() {
        let mut run = extraction("rta");
        run.ingest("localhost", "PING", 1000, "rta=0.5ms;100;500 pl=0%;20;60");

        assert!(run.counters().series("localhost", "PING", "rta").is_some());
        assert!(run.counters().series("localhost", "PING", "pl").is_none());
    }

    #[test]
    fn ingest_appends_every_observation_for_a_triple() {
        let mut run = extraction("all");
        run.ingest("h", "s", 300, "m=3");
        run.ingest("h", "s", 200, "m=2");
        run.ingest("h", "s", 100, "m=1");

        assert_eq!(
            run.counters().series("h", "s", "m").unwrap(),
            &[(300, 3.0), (200, 2.0), (100, 1.0)]
        );
    }

    #[test]
    fn ingest_tolerates_unparseable_perfdata() {
        let mut run = extraction("all");
        run.ingest("h", "s", 100, "not perfdata at all");
        assert!(run.counters().is_empty());
    }
}
