//! Wall-clock helpers and chart bucket alignment.

use std::time::{SystemTime, UNIX_EPOCH};

/// Width of one chart bucket in seconds (hourly history).
pub const BUCKET_SECS: i64 = 3600;

/// Current time as **milliseconds** since the Unix epoch.
#[inline]
pub fn now_ms() -> u64 {
    let d = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    d.as_millis() as u64
}

/// Current time as **seconds** since the Unix epoch.
#[inline]
pub fn now_s() -> i64 {
    let d = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    d.as_secs() as i64
}

/// Bucket index of a unix timestamp. Floor division, safe for pre-epoch
/// values.
#[inline]
pub fn hour_bucket(unix_secs: i64) -> i64 {
    unix_secs.div_euclid(BUCKET_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_boundaries() {
        assert_eq!(hour_bucket(0), 0);
        assert_eq!(hour_bucket(3599), 0);
        assert_eq!(hour_bucket(3600), 1);
        assert_eq!(hour_bucket(103_600), 28);
        assert_eq!(hour_bucket(103_650), 28);
        assert_eq!(hour_bucket(200_000), 55);
    }

    #[test]
    fn bucket_is_floor_for_negative_times() {
        assert_eq!(hour_bucket(-1), -1);
        assert_eq!(hour_bucket(-3600), -1);
        assert_eq!(hour_bucket(-3601), -2);
    }
}
