//! Time utilities for FlightSurety protocol.

use chrono::{DateTime, TimeZone, Utc};

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Convert unix seconds (the format flight schedules arrive in) to a timestamp.
pub fn from_unix_seconds(secs: i64) -> Option<Timestamp> {
    Utc.timestamp_opt(secs, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_unix_seconds() {
        let ts = from_unix_seconds(1_700_000_000).unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_out_of_range_seconds_rejected() {
        assert!(from_unix_seconds(i64::MAX).is_none());
    }
}
