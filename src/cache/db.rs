//! Durable cache backend on top of the [`EntryStore`]
//!
//! Each entry is stored as the JSON encoding of a [`CacheEntry`], so expiry is
//! carried inside the blob. Store failures never reach the caller: lookups turn
//! them into misses and writes log them and move on.

use std::sync::Arc;

use serde_json::Value;

use super::{Cache, CacheEntry, CacheKey, Clock, EntryStore, StoreError, SystemClock};

/// SQLite-backed [`Cache`] backend
#[derive(Clone)]
pub struct DbCache {
    store: EntryStore,
    clock: Arc<dyn Clock>,
}

impl DbCache {
    /// Creates a cache over `store` using wall clock time
    pub fn new(store: EntryStore) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Creates a cache over `store` that reads time from `clock`
    pub fn with_clock(store: EntryStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Returns the underlying store
    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    fn read_entry(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError> {
        match self.store.get(key.as_str())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_entry(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(entry)?;
        self.store.upsert(key.as_str(), &bytes)
    }
}

impl Cache for DbCache {
    fn lookup_value(&self, key: &CacheKey) -> Option<Value> {
        let entry = match self.read_entry(key) {
            Ok(entry) => entry?,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache lookup failed, treating as miss");
                return None;
            }
        };
        if entry.is_expired(self.clock.now()) {
            return None;
        }
        Some(entry.value)
    }

    fn set_value(&self, key: &CacheKey, value: Value, ttl_minutes: u64) {
        let entry = CacheEntry::new(value, self.clock.now(), ttl_minutes);
        if let Err(e) = self.write_entry(key, &entry) {
            tracing::warn!(key = %key, error = %e, "Cache write failed");
        }
    }

    fn remove(&self, key: &CacheKey) {
        if let Err(e) = self.store.delete(key.as_str()) {
            tracing::warn!(key = %key, error = %e, "Cache remove failed");
        }
    }

    fn reset(&self) {
        if let Err(e) = self.store.delete_all() {
            tracing::warn!(error = %e, "Cache reset failed");
        }
    }
}
