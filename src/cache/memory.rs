//! Transient in-process cache backend
//!
//! Entries live in a lock-guarded map and disappear when the process exits, which
//! suits the high-churn price key space where staleness after a restart is fine.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use super::{Cache, CacheEntry, CacheKey, Clock, SystemClock};

/// In-memory [`Cache`] backend
///
/// Cloning is cheap and clones share the same entries.
#[derive(Clone)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    /// Creates an empty cache using wall clock time
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty cache that reads time from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no entries are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache for MemoryCache {
    fn lookup_value(&self, key: &CacheKey) -> Option<Value> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key.as_str())?;
        if entry.is_expired(self.clock.now()) {
            return None;
        }
        Some(entry.value.clone())
    }

    fn set_value(&self, key: &CacheKey, value: Value, ttl_minutes: u64) {
        let entry = CacheEntry::new(value, self.clock.now(), ttl_minutes);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.as_str().to_string(), entry);
    }

    fn remove(&self, key: &CacheKey) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key.as_str());
    }

    fn reset(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheExt, ManualClock, Section};
    use chrono::{Duration, TimeZone, Utc};
    use serde::{Deserialize, Serialize};
    use std::thread;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn create_test_cache() -> (MemoryCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 7, 15, 9, 30, 0).unwrap(),
        ));
        (MemoryCache::with_clock(clock.clone()), clock)
    }

    #[test]
    fn test_lookup_returns_none_for_missing_key() {
        let (cache, _clock) = create_test_cache();
        let result: Option<TestData> = cache.lookup(Section::Price, "IBM");
        assert!(result.is_none(), "Should return None for missing key");
    }

    #[test]
    fn test_lookup_returns_value_before_expiry() {
        let (cache, clock) = create_test_cache();
        let data = TestData {
            name: "fresh".to_string(),
            value: 100,
        };

        cache.set(Section::Price, "IBM", &data, 60);
        clock.advance(Duration::minutes(59));

        assert_eq!(cache.lookup(Section::Price, "IBM"), Some(data));
    }

    #[test]
    fn test_lookup_returns_none_after_expiry() {
        let (cache, clock) = create_test_cache();
        let data = TestData {
            name: "stale".to_string(),
            value: 0,
        };

        cache.set(Section::Price, "IBM", &data, 60);
        clock.advance(Duration::minutes(60) + Duration::seconds(1));

        let result: Option<TestData> = cache.lookup(Section::Price, "IBM");
        assert!(result.is_none(), "Expired entry should be a miss");
        assert_eq!(cache.len(), 1, "Expiry is lazy, the entry stays stored");
    }

    #[test]
    fn test_set_overwrites_existing_entry() {
        let (cache, _clock) = create_test_cache();
        let first = TestData {
            name: "first".to_string(),
            value: 1,
        };
        let second = TestData {
            name: "second".to_string(),
            value: 2,
        };

        cache.set(Section::Price, "IBM", &first, 60);
        cache.set(Section::Price, "IBM", &second, 60);

        assert_eq!(cache.lookup(Section::Price, "IBM"), Some(second));
    }

    #[test]
    fn test_overwrite_refreshes_expiry() {
        let (cache, clock) = create_test_cache();

        cache.set(Section::Price, "IBM", &1, 5);
        clock.advance(Duration::minutes(4));
        cache.set(Section::Price, "IBM", &2, 5);
        clock.advance(Duration::minutes(4));

        assert_eq!(cache.lookup::<i32>(Section::Price, "IBM"), Some(2));
    }

    #[test]
    fn test_sections_partition_keys() {
        let (cache, _clock) = create_test_cache();
        cache.set(Section::Price, "IBM", &42, 60);

        assert_eq!(cache.lookup::<i32>(Section::Price, "IBM"), Some(42));
        assert_eq!(cache.lookup::<i32>(Section::Overview, "IBM"), None);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (cache, _clock) = create_test_cache();
        let key = CacheKey::new(Section::Price, "IBM");

        cache.remove(&key);
        cache.set(Section::Price, "IBM", &1, 60);
        cache.remove(&key);
        cache.remove(&key);

        assert!(cache.lookup::<i32>(Section::Price, "IBM").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reset_clears_all_entries() {
        let (cache, _clock) = create_test_cache();
        cache.set(Section::Price, "IBM", &1, 60);
        cache.set(Section::Overview, "IBM", &2, 60);

        cache.reset();
        cache.reset();

        assert!(cache.is_empty());
        assert!(cache.lookup::<i32>(Section::Overview, "IBM").is_none());
    }

    #[test]
    fn test_type_mismatch_is_a_miss() {
        let (cache, _clock) = create_test_cache();
        cache.set(Section::Price, "IBM", &"not a struct", 60);

        let result: Option<TestData> = cache.lookup(Section::Price, "IBM");
        assert!(result.is_none());
    }

    #[test]
    fn test_clones_share_entries() {
        let (cache, _clock) = create_test_cache();
        let other = cache.clone();

        cache.set(Section::Price, "XAU", &1900.5, 60);

        assert_eq!(other.lookup::<f64>(Section::Price, "XAU"), Some(1900.5));
    }

    #[test]
    fn test_concurrent_writers_leave_a_complete_entry() {
        let cache = MemoryCache::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        let data = TestData {
                            name: format!("writer-{}", i),
                            value: i,
                        };
                        cache.set(Section::Price, "IBM", &data, 60);
                        let read: Option<TestData> = cache.lookup(Section::Price, "IBM");
                        let read = read.expect("Entry should always be readable");
                        assert_eq!(read.name, format!("writer-{}", read.value));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("Writer thread panicked");
        }
        assert_eq!(cache.len(), 1);
    }
}
