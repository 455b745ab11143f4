//! Time helpers; all timestamps are unix seconds

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds in a day
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Current timestamp in seconds since Unix epoch
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// UTC day number of a timestamp
pub fn day_index(timestamp: u64) -> u64 {
    timestamp / SECONDS_PER_DAY
}

/// Whole days from `from` to `to`, zero if `to` is earlier
pub fn whole_days_between(from: u64, to: u64) -> u64 {
    to.saturating_sub(from) / SECONDS_PER_DAY
}

/// Timestamp `days` days before `timestamp`, saturating at the epoch
pub fn days_before(timestamp: u64, days: u64) -> u64 {
    timestamp.saturating_sub(days.saturating_mul(SECONDS_PER_DAY))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_days() {
        assert_eq!(whole_days_between(0, SECONDS_PER_DAY - 1), 0);
        assert_eq!(whole_days_between(0, 365 * SECONDS_PER_DAY), 365);
        assert_eq!(whole_days_between(100, 50), 0);
    }

    #[test]
    fn test_day_index_and_offsets() {
        let ts = 10 * SECONDS_PER_DAY + 5;
        assert_eq!(day_index(ts), 10);
        assert_eq!(days_before(ts, 3), 7 * SECONDS_PER_DAY + 5);
        assert_eq!(days_before(ts, 1000), 0);
    }
}
