//! Hourly rate and the settings that hold it

use std::fmt;
use tracing::warn;

/// Currency amount charged per hour of occupancy. Never negative, never NaN.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct HourlyRate(f64);

impl HourlyRate {
    pub const ZERO: HourlyRate = HourlyRate(0.0);

    /// Build a rate from operator input. Negative or non-finite input is
    /// clamped to zero.
    pub fn new(input: f64) -> Self {
        if input.is_finite() && input >= 0.0 {
            // Normalizes -0.0
            Self(input + 0.0)
        } else {
            warn!(input, "Invalid hourly rate, clamping to zero");
            Self::ZERO
        }
    }

    pub fn get(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for HourlyRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Anything that can report the rate currently in effect
pub trait RateSource {
    fn hourly_rate(&self) -> HourlyRate;
}

impl RateSource for HourlyRate {
    fn hourly_rate(&self) -> HourlyRate {
        *self
    }
}

/// Mutable billing settings owned by the engine
#[derive(Debug, Clone)]
pub struct RateSettings {
    rate: HourlyRate,
    currency: String,
}

impl RateSettings {
    pub fn new(rate: HourlyRate, currency: impl Into<String>) -> Self {
        Self {
            rate,
            currency: currency.into(),
        }
    }

    /// Replace the rate, returning the value actually stored
    pub fn set(&mut self, input: f64) -> HourlyRate {
        self.rate = HourlyRate::new(input);
        self.rate
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

impl RateSource for RateSettings {
    fn hourly_rate(&self) -> HourlyRate {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_rates_kept() {
        assert_eq!(HourlyRate::new(50.0).get(), 50.0);
        assert_eq!(HourlyRate::new(0.0).get(), 0.0);
        assert_eq!(HourlyRate::new(12.75).get(), 12.75);
    }

    #[test]
    fn test_invalid_rates_clamped() {
        assert_eq!(HourlyRate::new(-10.0), HourlyRate::ZERO);
        assert_eq!(HourlyRate::new(f64::NAN), HourlyRate::ZERO);
        assert_eq!(HourlyRate::new(f64::INFINITY), HourlyRate::ZERO);
        assert!(HourlyRate::new(-0.0).get().is_sign_positive());
    }

    #[test]
    fn test_settings_set_returns_stored_rate() {
        let mut settings = RateSettings::new(HourlyRate::new(50.0), "EGP");

        assert_eq!(settings.set(75.0).get(), 75.0);
        assert_eq!(settings.hourly_rate().get(), 75.0);

        assert_eq!(settings.set(-1.0), HourlyRate::ZERO);
        assert_eq!(settings.hourly_rate(), HourlyRate::ZERO);
        assert_eq!(settings.currency(), "EGP");
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(HourlyRate::new(50.0).to_string(), "50.00");
    }
}
