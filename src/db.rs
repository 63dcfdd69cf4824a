//! Database file bootstrap
//!
//! A database file is created once with `-i` and reused on every later start.
//! Creation runs in a single transaction, and a failed init removes the file
//! again so the next `-i` can retry.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use thiserror::Error;

use crate::cache::{EntryStore, StoreError, CREATE_CACHE_TABLE_SQL};

/// Schema statements run when initializing a new file
const INIT_STATEMENTS: [&str; 3] = [
    "CREATE TABLE user (user_id INTEGER PRIMARY KEY NOT NULL, username TEXT UNIQUE, password TEXT, active INTEGER NOT NULL, email TEXT);",
    "INSERT INTO user (user_id, username, password, active, email) VALUES (1, 'admin', '', 1, '');",
    CREATE_CACHE_TABLE_SQL,
];

/// Errors raised while creating or opening the database file
#[derive(Debug, Error)]
pub enum DbError {
    /// Refusing to initialize over an existing file
    #[error("File '{}' already exists. Can't initialize it.", .0.display())]
    AlreadyExists(PathBuf),

    /// The database file to serve from is missing
    #[error("Database file '{}' doesn't exist. Create one using:\n\tquotecache -i <quotes.db>", .0.display())]
    NotFound(PathBuf),

    /// SQLite error while creating the schema
    #[error("Error initializing '{}': {source}", .path.display())]
    Init {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The file exists but could not be opened as a cache store
    #[error("Error opening '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: StoreError,
    },
}

/// Creates and initializes a new database file
///
/// # Returns
/// * `Ok(())` once the schema is committed
/// * `Err(DbError::AlreadyExists)` if `path` already exists
/// * `Err(DbError::Init)` if the schema failed; the file is removed again
pub fn create_database(path: &Path) -> Result<(), DbError> {
    create_with_schema(path, &INIT_STATEMENTS)
}

fn create_with_schema(path: &Path, statements: &[&str]) -> Result<(), DbError> {
    if path.exists() {
        return Err(DbError::AlreadyExists(path.to_path_buf()));
    }

    if let Err(source) = initialize_schema(path, statements) {
        if path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::warn!("Failed to remove partial file '{}': {}", path.display(), e);
            }
        }
        return Err(DbError::Init {
            path: path.to_path_buf(),
            source,
        });
    }

    tracing::info!("Initialized database file '{}'", path.display());
    Ok(())
}

/// Runs `statements` in one transaction on a new connection to `path`
fn initialize_schema(path: &Path, statements: &[&str]) -> rusqlite::Result<()> {
    let mut conn = Connection::open(path)?;
    let tx = conn.transaction()?;
    for statement in statements {
        tx.execute(statement, [])?;
    }
    tx.commit()
}

/// Opens an existing database file as a cache store
///
/// The cache table is created if the file predates it.
pub fn open_database(path: &Path) -> Result<EntryStore, DbError> {
    if !path.exists() {
        return Err(DbError::NotFound(path.to_path_buf()));
    }
    EntryStore::open(path).map_err(|source| DbError::Open {
        path: path.to_path_buf(),
        source,
    })
}
