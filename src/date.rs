//! Parsing and formatting of check dates for display.
//!
//! Check timestamps are seconds since epoch, UTC. Trace lines display them
//! in a configurable fixed offset (`--utc-offset`) instead of a hardcoded
//! deployment zone.

use chrono::{DateTime, FixedOffset};

/// Parse a `±HH:MM` offset string (also accepts `Z` for UTC).
pub fn parse_offset(raw: &str) -> Option<FixedOffset> {
    if raw == "Z" || raw == "z" {
        return FixedOffset::east_opt(0);
    }
    let sign = raw.chars().next()?;
    let rest = raw.get(1..)?;
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 || hours < 0 || minutes < 0 {
        return None;
    }
    let seconds = hours * 3600 + minutes * 60;
    match sign {
        '+' => FixedOffset::east_opt(seconds),
        '-' => FixedOffset::west_opt(seconds),
        _ => None,
    }
}

/// Format an epoch timestamp as `YYYY-MM-DD HH:MM:SS` in the given offset.
pub fn format_timestamp(timestamp: i64, offset: FixedOffset) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(utc) => utc
            .with_timezone(&offset)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => timestamp.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_utc_and_positive_offsets() {
        assert_eq!(parse_offset("+00:00").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_offset("Z").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_offset("+02:00").unwrap().local_minus_utc(), 7200);
        assert_eq!(parse_offset("+05:30").unwrap().local_minus_utc(), 19800);
    }

    #[test]
    fn parses_negative_offsets() {
        assert_eq!(parse_offset("-05:30").unwrap().local_minus_utc(), -19800);
    }

    #[test]
    fn rejects_malformed_offsets() {
        assert!(parse_offset("").is_none());
        assert!(parse_offset("paris").is_none());
        assert!(parse_offset("+25:00").is_none());
        assert!(parse_offset("+02:75").is_none());
        assert!(parse_offset("02:00").is_none());
    }

    #[test]
    fn formats_in_the_requested_offset() {
        let utc = parse_offset("+00:00").unwrap();
        assert_eq!(format_timestamp(0, utc), "1970-01-01 00:00:00");

        let paris_summer = parse_offset("+02:00").unwrap();
        assert_eq!(format_timestamp(0, paris_summer), "1970-01-01 02:00:00");
    }
}
