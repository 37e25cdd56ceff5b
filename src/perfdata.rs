//! Performance-data parsing.
//!
//! Check results embed a performance-data string of space-separated tokens:
//!
//! ```text
//! name=value[unit];[warn];[crit];[min];[max]
//! ```
//!
//! Metric names may be single-quoted to contain spaces (`'disk used'=12MB`).
//! Parsing is lenient: a malformed token is skipped, the rest of the string
//! still parses, and an empty or fully unparseable string yields an empty
//! sequence rather than an error.
//!
//! ## Example
//!
//! ```
//! use counterwatch::perfdata::PerfData;
//!
//! let perf = PerfData::parse("rta=0.5ms;100;500 pl=0%;20;60");
//! let names: Vec<_> = perf.iter().map(|m| m.name.as_str()).collect();
//! assert_eq!(names, ["pl", "rta"]); // sorted by name
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static METRIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^'?([^'=]+)'?=([-+\d.eE]+)([\w/%]*)(?:;([^;]*))?(?:;([^;]*))?(?:;([^;]*))?(?:;([^;]*))?;?$",
    )
    .expect("metric token pattern is valid")
});

/// One observation parsed from a performance-data token.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    /// Metric name, unquoted.
    pub name: String,
    /// Numeric value.
    pub value: f64,
    /// Unit of measure suffix ("ms", "%", "B", ...), possibly empty.
    pub uom: String,
    /// Warning threshold, when given as a plain number.
    pub warning: Option<f64>,
    /// Critical threshold, when given as a plain number.
    pub critical: Option<f64>,
    /// Minimum bound.
    pub min: Option<f64>,
    /// Maximum bound.
    pub max: Option<f64>,
}

/// The parsed metrics of one performance-data string, sorted by name.
///
/// Duplicate names are kept as separate observations in their original
/// relative order; combining them is the aggregator's business.
#[derive(Debug, Clone, Default)]
pub struct PerfData {
    metrics: Vec<Metric>,
}

impl PerfData {
    /// Parse a raw performance-data string.
    pub fn parse(raw: &str) -> Self {
        let mut metrics = Vec::new();
        for token in split_tokens(raw) {
            match parse_token(&token) {
                Some(metric) => metrics.push(metric),
                None => debug!("skipping malformed perfdata token: {token}"),
            }
        }
        metrics.sort_by(|a, b| a.name.cmp(&b.name));
        Self { metrics }
    }

    /// Number of parsed observations.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether nothing was parsed.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Iterate over the observations in name order.
    pub fn iter(&self) -> std::slice::Iter<'_, Metric> {
        self.metrics.iter()
    }
}

impl<'a> IntoIterator for &'a PerfData {
    type Item = &'a Metric;
    type IntoIter = std::slice::Iter<'a, Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.metrics.iter()
    }
}

impl IntoIterator for PerfData {
    type Item = Metric;
    type IntoIter = std::vec::IntoIter<Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.metrics.into_iter()
    }
}

/// Split on whitespace, keeping single-quoted names in one token.
fn split_tokens(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in raw.trim().chars() {
        match ch {
            '\'' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn parse_token(token: &str) -> Option<Metric> {
    let caps = METRIC_RE.captures(token)?;
    let name = caps.get(1)?.as_str().trim();
    if name.is_empty() {
        return None;
    }
    let value: f64 = caps.get(2)?.as_str().parse().ok()?;

    Some(Metric {
        name: name.to_string(),
        value,
        uom: caps.get(3).map_or_else(String::new, |m| m.as_str().to_string()),
        warning: threshold(caps.get(4)),
        critical: threshold(caps.get(5)),
        min: threshold(caps.get(6)),
        max: threshold(caps.get(7)),
    })
}

// Range syntax (`10:20`, `@`, `~`) is accepted on the wire but carries no
// meaning for extraction; anything that is not a plain number becomes None.
fn threshold(field: Option<regex::Match>) -> Option<f64> {
    field.and_then(|m| m.as_str().parse().ok())
}
