//! Typed load/save of the hourly rate and session history.
//!
//! Loading never fails: malformed or unreadable data falls back to the
//! default with a warning so startup is never blocked.

use playmeter_api::SessionRecord;
use tracing::{debug, warn};

use crate::{KEY_HISTORY, KEY_HOURLY_RATE, KvStore, StoreResult};

/// Load the persisted hourly rate, `None` if absent or unreadable
pub fn load_hourly_rate(store: &dyn KvStore) -> Option<f64> {
    let raw = match store.load(KEY_HOURLY_RATE) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, "Failed to read hourly rate, using default");
            return None;
        }
    };

    match raw.trim().parse::<f64>() {
        Ok(rate) if rate.is_finite() => Some(rate),
        _ => {
            warn!(value = %raw, "Stored hourly rate is malformed, using default");
            None
        }
    }
}

pub fn save_hourly_rate(store: &dyn KvStore, rate: f64) -> StoreResult<()> {
    store.save(KEY_HOURLY_RATE, &rate.to_string())
}

/// Load the persisted history, oldest first. Inconsistent records are dropped.
pub fn load_history(store: &dyn KvStore) -> Vec<SessionRecord> {
    let raw = match store.load(KEY_HISTORY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, "Failed to read history, starting empty");
            return Vec::new();
        }
    };

    let records: Vec<SessionRecord> = match serde_json::from_str(&raw) {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "Stored history is malformed, starting empty");
            return Vec::new();
        }
    };

    let loaded = records.len();
    let records: Vec<SessionRecord> = records.into_iter().filter(|r| r.is_consistent()).collect();
    if records.len() != loaded {
        warn!(
            dropped = loaded - records.len(),
            "Dropped inconsistent history records"
        );
    }

    debug!(count = records.len(), "History loaded");
    records
}

pub fn save_history(store: &dyn KvStore, records: &[SessionRecord]) -> StoreResult<()> {
    let json = serde_json::to_string(records)?;
    store.save(KEY_HISTORY, &json)
}
