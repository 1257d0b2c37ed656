//! Checkpoint timestamps are kept at millisecond precision so that a value
//! read back from any store compares equal to the one written.

use chrono::{DateTime, Utc};

/// Current time in epoch millis.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current time truncated to whole milliseconds.
pub fn now() -> DateTime<Utc> {
    from_millis(now_ms())
}

/// Convert epoch millis back to a timestamp; out-of-range values clamp to the epoch.
pub fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_round_trips_through_millis() {
        let t = now();
        assert_eq!(from_millis(t.timestamp_millis()), t);
    }

    #[test]
    fn out_of_range_millis_clamp_to_epoch() {
        assert_eq!(from_millis(i64::MAX), DateTime::<Utc>::default());
    }
}
