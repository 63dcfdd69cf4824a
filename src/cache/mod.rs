//! Cache module for shielding upstream providers from repeated requests
//!
//! This module defines the [`Cache`] contract shared by every backend: a key-value
//! store with per-entry expiry where the TTL is chosen by the caller on each write.
//! Two backends implement it:
//!
//! - [`MemoryCache`] keeps entries in process memory and loses them on restart
//! - [`DbCache`] persists entries into the SQLite-backed [`EntryStore`]
//!
//! Expired entries are treated as absent on lookup; there is no background sweep.

mod clock;
mod db;
mod entry_store;
mod memory;

pub use clock::{Clock, ManualClock, SystemClock};
pub use db::DbCache;
pub(crate) use entry_store::CREATE_CACHE_TABLE_SQL;
pub use entry_store::{EntryStore, StoreError};
pub use memory::MemoryCache;

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Separator between the section and identifier parts of a cache key
const KEY_SEPARATOR: char = ':';

/// Namespace of a cache key, distinguishing payload kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Company identity data (name, description, exchange)
    Overview,
    /// Latest trading price data
    Price,
}

impl Section {
    /// Returns the stable name used when building keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Overview => "overview",
            Section::Price => "price",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite cache key of a section and an uppercased identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds the key for `id` within `section`
    ///
    /// The identifier is uppercased so `aapl` and `AAPL` share an entry.
    pub fn new(section: Section, id: &str) -> Self {
        Self(format!(
            "{}{}{}",
            section.as_str(),
            KEY_SEPARATOR,
            id.to_uppercase()
        ))
    }

    /// Returns the key as stored by the backends
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A cached value together with the moment it stops being valid
///
/// This is the unit both backends store. The durable backend serializes the
/// whole entry, so expiry travels inside the stored blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached payload
    pub value: Value,
    /// When the entry expires
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry that expires `ttl_minutes` after `now`
    pub fn new(value: Value, now: DateTime<Utc>, ttl_minutes: u64) -> Self {
        let ttl = i64::try_from(ttl_minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .unwrap_or(Duration::MAX);
        Self {
            value,
            expires_at: now
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Whether the entry is past its expiry at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Backend-agnostic cache contract
///
/// Implementations must be safe to share between concurrently running requests.
/// None of the operations fail: backend problems degrade to misses on lookup and
/// are logged and ignored on writes.
pub trait Cache: Send + Sync {
    /// Returns a copy of the value stored under `key`, or `None` if it is absent
    /// or expired
    fn lookup_value(&self, key: &CacheKey) -> Option<Value>;

    /// Stores `value` under `key` for `ttl_minutes`, replacing any existing entry
    fn set_value(&self, key: &CacheKey, value: Value, ttl_minutes: u64);

    /// Removes the entry under `key`; removing an absent key is a no-op
    fn remove(&self, key: &CacheKey);

    /// Removes every entry
    fn reset(&self);
}

/// Typed access on top of [`Cache`]
///
/// Values are stored as JSON values, so any serde type can be cached. A stored
/// value that does not decode into the requested type is reported as a miss.
pub trait CacheExt: Cache {
    /// Looks up the value for `id` within `section`
    fn lookup<T: DeserializeOwned>(&self, section: Section, id: &str) -> Option<T> {
        let key = CacheKey::new(section, id);
        let value = self.lookup_value(&key)?;
        match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Stores `item` for `id` within `section` for `ttl_minutes`
    fn set<T: Serialize>(&self, section: Section, id: &str, item: &T, ttl_minutes: u64) {
        let key = CacheKey::new(section, id);
        match serde_json::to_value(item) {
            Ok(value) => self.set_value(&key, value, ttl_minutes),
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    error = %e,
                    "Skipping cache write for unserializable value"
                );
            }
        }
    }
}

impl<C: Cache + ?Sized> CacheExt for C {}
