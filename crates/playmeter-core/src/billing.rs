//! Billing calculator
//!
//! Cost is strictly proportional to elapsed time: no minimum charge, no
//! per-block rounding.

use crate::HourlyRate;

pub use playmeter_api::MS_PER_MINUTE;

/// Milliseconds in one hour
pub const MS_PER_HOUR: f64 = 3_600_000.0;

/// Cost of `duration_ms` at `rate`. Non-positive durations cost nothing.
pub fn cost(duration_ms: i64, rate: HourlyRate) -> f64 {
    if duration_ms <= 0 {
        return 0.0;
    }
    duration_ms as f64 / MS_PER_HOUR * rate.get()
}

/// Duration in fractional minutes, unrounded
pub fn duration_minutes(duration_ms: i64) -> f64 {
    duration_ms.max(0) as f64 / MS_PER_MINUTE
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: i64 = 60_000;
    const HOUR: i64 = 60 * MINUTE;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn one_hour_at_fifty() {
        assert!(approx(cost(HOUR, HourlyRate::new(50.0)), 50.0));
        assert!(approx(duration_minutes(HOUR), 60.0));
    }

    #[test]
    fn partial_hours_are_not_rounded() {
        let rate = HourlyRate::new(40.0);
        assert!(approx(cost(90 * MINUTE, rate), 60.0));
        assert!(approx(cost(1, rate), 40.0 / 3_600_000.0));
        assert!(approx(duration_minutes(90_500), 90_500.0 / 60_000.0));
    }

    #[test]
    fn non_positive_duration_is_free() {
        let rate = HourlyRate::new(50.0);
        assert_eq!(cost(0, rate), 0.0);
        assert_eq!(cost(-5_000, rate), 0.0);
        assert_eq!(duration_minutes(-5_000), 0.0);
    }

    #[test]
    fn zero_rate_is_free() {
        assert_eq!(cost(HOUR, HourlyRate::ZERO), 0.0);
    }

    #[test]
    fn cost_is_monotonic() {
        let rates = [0.0, 0.5, 10.0, 50.0, 123.45];
        let durations = [0, 1, 999, MINUTE, 17 * MINUTE, HOUR, 5 * HOUR];

        for rate in rates {
            let rate = HourlyRate::new(rate);
            for pair in durations.windows(2) {
                assert!(cost(pair[0], rate) <= cost(pair[1], rate));
            }
        }

        for duration in durations {
            for pair in rates.windows(2) {
                let low = cost(duration, HourlyRate::new(pair[0]));
                let high = cost(duration, HourlyRate::new(pair[1]));
                assert!(low <= high);
            }
        }
    }
}
