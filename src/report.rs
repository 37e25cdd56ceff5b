//! Result emission: the final JSON document and the error banner.

use crate::counters::Counters;

/// Process exit codes.
pub mod exit_code {
    /// Extraction succeeded.
    pub const OK: i32 = 0;
    /// Backend access was denied.
    pub const AUTH_DENIED: i32 = 2;
    /// Extraction produced no data or encountered recoverable errors.
    pub const NO_DATA: i32 = 4;
    /// Command line parameters were not used correctly.
    pub const USAGE: i32 = 64;
}

const BANNER_WIDTH: usize = 80;

/// Serialize the aggregate as the single JSON document printed on stdout.
pub fn render_counters(counters: &Counters) -> serde_json::Result<String> {
    serde_json::to_string(counters)
}

/// Render accumulated soft errors between two banner lines.
pub fn render_errors(errors: &[String]) -> String {
    let bar = "#".repeat(BANNER_WIDTH);
    let mut out = String::new();
    out.push_str(&bar);
    out.push('\n');
    out.push_str("counterwatch, errors encountered during extraction:\n");
    for error in errors {
        out.push_str("- ");
        out.push_str(error);
        out.push('\n');
    }
    out.push_str(&bar);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_render_as_compact_json() {
        let mut counters = Counters::new();
        counters.insert("localhost", "PING", "rta", 100, 0.5);
        assert_eq!(
            render_counters(&counters).unwrap(),
            r#"{"localhost":{"PING":{"rta":[[100,0.5]]}}}"#
        );
    }

    #[test]
    fn errors_render_between_banner_lines() {
        let rendered = render_errors(&["first error".to_string(), "second error".to_string()]);
        let lines: Vec<_> = rendered.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "#".repeat(BANNER_WIDTH));
        assert_eq!(lines[1], "counterwatch, errors encountered during extraction:");
        assert_eq!(lines[2], "- first error");
        assert_eq!(lines[3], "- second error");
        assert_eq!(lines[4], "#".repeat(BANNER_WIDTH));
    }
}
