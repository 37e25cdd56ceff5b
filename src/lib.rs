//! # counterwatch
//!
//! Extracts counter time-series from a monitoring backend's historical
//! check results.
//!
//! The backend stores one log record per executed check, each carrying a
//! raw performance-data string. counterwatch authenticates, fetches the
//! records matching a host/service/metric selection, parses the embedded
//! metrics, and prints one JSON document mapping host → service → metric
//! → `[timestamp, value]` pairs.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        extraction run                      │
//! │  ┌─────────┐   ┌──────────┐   ┌────────┐   ┌───────────┐  │
//! │  │ backend │──▶│ perfdata │──▶│ select │──▶│ counters  │  │
//! │  │ (fetch) │   │ (parse)  │   │(filter)│   │(aggregate)│  │
//! │  └────┬────┘   └──────────┘   └────────┘   └─────┬─────┘  │
//! │       │                                          ▼        │
//! │       │                                    ┌──────────┐   │
//! │       └── Bulk | PerEntity strategies      │  report  │   │
//! │                                            │  (emit)  │   │
//! │                                            └──────────┘   │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`backend`]: authenticated REST session: login/token, paginated GETs,
//!   query-parameter encoding
//! - [`perfdata`]: performance-data string → sorted metric observations
//! - [`select`]: the "all"-or-list selection criteria and their backend
//!   `where` clauses
//! - [`counters`]: the nested time-series aggregate
//! - [`extract`]: the two fetch strategies driving filter and aggregate
//! - [`report`]: JSON emission, error banner, exit codes
//! - [`date`]: display formatting of check timestamps
//!
//! ## Usage
//!
//! ```bash
//! # All counters of all PING services, as one JSON document
//! counterwatch -S PING
//!
//! # Only the rta counter of two specific hosts, queried per entity
//! counterwatch -H web-01,web-02 -M rta --per-entity
//! ```

pub mod backend;
pub mod counters;
pub mod date;
pub mod error;
pub mod extract;
pub mod perfdata;
pub mod report;
pub mod select;

// Re-export main types for convenience
pub use backend::{BackendSession, Page, ResourceQuery};
pub use counters::{Counters, Series};
pub use error::BackendError;
pub use extract::{CheckResult, Extraction, QueryMode};
pub use perfdata::{Metric, PerfData};
pub use select::{Select, Selection};
