//! Store trait definitions

use crate::StoreResult;

/// Key under which the hourly rate is saved, as decimal text
pub const KEY_HOURLY_RATE: &str = "hourly_rate";

/// Key under which the history is saved, as a JSON array oldest first
pub const KEY_HISTORY: &str = "history";

/// Best-effort local key-value store
pub trait KvStore: Send + Sync {
    /// Load the value for `key`, `None` if never saved
    fn load(&self, key: &str) -> StoreResult<Option<String>>;

    /// Save `value` under `key`, replacing any previous value
    fn save(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
