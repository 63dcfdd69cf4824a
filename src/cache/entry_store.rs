//! SQLite table of serialized cache entries
//!
//! The store maps a key to an opaque blob and knows nothing about expiry. Each
//! mutation is a single auto-committing statement.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

/// Statement creating the cache table if it is missing
pub(crate) const CREATE_CACHE_TABLE_SQL: &str =
    "CREATE TABLE IF NOT EXISTS dbcache (key TEXT PRIMARY KEY NOT NULL, content BLOB);";

/// Errors raised by the entry store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying database reported an error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored blob could not be encoded or decoded
    #[error("Invalid cache entry encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Durable key to blob table backed by a shared SQLite connection
///
/// Cloning is cheap and clones share the connection.
#[derive(Debug, Clone)]
pub struct EntryStore {
    conn: Arc<Mutex<Connection>>,
}

impl EntryStore {
    /// Wraps an open connection and makes sure the cache table exists
    pub fn new(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(CREATE_CACHE_TABLE_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens (or creates) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::new(Connection::open(path)?)
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::new(Connection::open_in_memory()?)
    }

    /// Runs `f` with exclusive access to the connection
    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&conn)?)
    }

    /// Returns the blob stored under `key`, if any
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT content FROM dbcache WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
        })
    }

    /// Inserts or replaces the blob stored under `key`
    pub fn upsert(&self, key: &str, content: &[u8]) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO dbcache (key, content) VALUES (?1, ?2)",
                params![key, content],
            )
        })?;
        Ok(())
    }

    /// Deletes the row for `key`, returning whether one existed
    pub fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let deleted = self
            .with_conn(|conn| conn.execute("DELETE FROM dbcache WHERE key = ?1", params![key]))?;
        Ok(deleted > 0)
    }

    /// Deletes every row, returning how many were removed
    pub fn delete_all(&self) -> Result<usize, StoreError> {
        self.with_conn(|conn| conn.execute("DELETE FROM dbcache", []))
    }

    /// Number of stored rows
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM dbcache", [], |row| row.get(0))
        })?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}
