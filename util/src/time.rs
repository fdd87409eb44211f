//! General time utility functions

use std::time::Instant;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Seconds elapsed between `earlier` and `now`.
///
/// Saturates at zero if `earlier` is actually later than `now`, which can
/// happen when two tasks read the clock in a different order to the one they
/// take the state lock in.
pub fn seconds_since(earlier: Instant, now: Instant) -> f64 {
    now.saturating_duration_since(earlier).as_secs_f64()
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(duration_to_seconds(chrono::Duration::milliseconds(1500)), Some(1.5));
        assert_eq!(duration_to_seconds(chrono::Duration::max_value()), None);
    }

    #[test]
    fn test_seconds_since_saturates() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(250);

        assert!((seconds_since(t0, t1) - 0.25).abs() < 1e-9);
        assert_eq!(seconds_since(t1, t0), 0.0);
    }
}
