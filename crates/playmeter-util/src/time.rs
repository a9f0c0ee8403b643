//! Time utilities for playmeter
//!
//! Sessions are timed with absolute millisecond timestamps supplied by a
//! [`Clock`]. The daemon uses [`SystemClock`]; tests drive a [`ManualClock`].
//!
//! # Mock Time for Development
//!
//! In debug builds, the `PLAYMETER_MOCK_TIME` environment variable shifts the
//! system clock to a fixed local start point that then advances in real time.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 14:30:00`)

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicI64, Ordering};

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "PLAYMETER_MOCK_TIME";

/// Format accepted by `PLAYMETER_MOCK_TIME`
pub const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static MOCK_TIME_OFFSET_MS: OnceLock<Option<i64>> = OnceLock::new();

fn mock_time_offset_ms() -> Option<i64> {
    *MOCK_TIME_OFFSET_MS.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            let raw = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
            match parse_mock_time(&raw) {
                Some(mock) => {
                    let offset = mock - Utc::now().timestamp_millis();
                    tracing::info!(mock_time = %raw, offset_ms = offset, "Mock time enabled");
                    Some(offset)
                }
                None => {
                    tracing::warn!(
                        mock_time = %raw,
                        expected_format = MOCK_TIME_FORMAT,
                        "Invalid mock time, using real time"
                    );
                    None
                }
            }
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Parse a mock time string in local time into epoch milliseconds
fn parse_mock_time(raw: &str) -> Option<i64> {
    let naive = NaiveDateTime::parse_from_str(raw, MOCK_TIME_FORMAT).ok()?;
    let local = Local.from_local_datetime(&naive).single()?;
    Some(local.timestamp_millis())
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    mock_time_offset_ms().is_some()
}

/// Absolute point in time, milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const EPOCH: Timestamp = Timestamp(0);

    pub const fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// Milliseconds from `earlier` to `self`, zero if `earlier` is later
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0).max(0)
    }

    pub fn saturating_add_millis(&self, ms: i64) -> Self {
        Self(self.0.saturating_add(ms))
    }

    /// Convert to local wall-clock time for display
    pub fn to_local(&self) -> Option<DateTime<Local>> {
        DateTime::<Utc>::from_timestamp_millis(self.0).map(|dt| dt.with_timezone(&Local))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_local() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock, respecting mock time settings in debug builds
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let real = Utc::now().timestamp_millis();
        Timestamp(real + mock_time_offset_ms().unwrap_or(0))
    }
}

/// Manually driven clock for tests. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(start.as_millis())),
        }
    }

    pub fn set(&self, at: Timestamp) {
        self.millis.store(at.as_millis(), Ordering::SeqCst);
    }

    pub fn advance_millis(&self, ms: i64) {
        self.millis.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.millis.load(Ordering::SeqCst))
    }
}

/// Format elapsed milliseconds as `HH:MM:SS`. Hours do not wrap at 24.
pub fn format_elapsed(ms: i64) -> String {
    let total_secs = ms.max(0) / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Format a timestamp as local `HH:MM` for the history log
pub fn format_clock_time(ts: Timestamp) -> String {
    ts.to_local()
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(999), "00:00:00");
        assert_eq!(format_elapsed(61_000), "00:01:01");
        assert_eq!(format_elapsed(3_661_000), "01:01:01");
        assert_eq!(format_elapsed(90_000_000), "25:00:00");
        assert_eq!(format_elapsed(-5), "00:00:00");
    }

    #[test]
    fn test_millis_since_saturates() {
        let a = Timestamp::from_millis(1_000);
        let b = Timestamp::from_millis(4_500);
        assert_eq!(b.millis_since(a), 3_500);
        assert_eq!(a.millis_since(b), 0);
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(Timestamp::from_millis(10));
        let other = clock.clone();

        other.advance_millis(90);
        assert_eq!(clock.now(), Timestamp::from_millis(100));

        clock.set(Timestamp::EPOCH);
        assert_eq!(other.now(), Timestamp::EPOCH);
    }

    #[test]
    fn test_system_clock_is_recent() {
        let now = SystemClock.now();
        let year = now.to_local().unwrap().format("%Y").to_string();
        let year: i32 = year.parse().unwrap();
        assert!((2020..=2100).contains(&year));
    }

    #[test]
    fn test_timestamp_serializes_as_number() {
        let json = serde_json::to_string(&Timestamp::from_millis(3_600_000)).unwrap();
        assert_eq!(json, "3600000");
    }

    #[test]
    fn test_parse_mock_time() {
        assert!(parse_mock_time("2025-12-25 14:30:00").is_some());
        assert!(parse_mock_time("2025-12-25T14:30:00").is_none());
        assert!(parse_mock_time("").is_none());
    }
}
