//! In-memory store for tests and ephemeral runs

use std::collections::HashMap;
use std::sync::RwLock;

use crate::{KvStore, StoreError, StoreResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        let values = self.values.read().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut values = self.values.write().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        !self.values.is_poisoned()
    }
}
