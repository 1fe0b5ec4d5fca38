// String-keyed key-value backends

use crate::error::PersistenceError;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the SQLite database file inside the data directory
pub const DB_FILE_NAME: &str = "todostore.db";

/// Raw get/set primitive the repository persists through
///
/// `set` must be all-or-nothing: on failure the previous value stays readable.
pub trait KvBackend {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

fn check_quota(key: &str, value: &str, limit: Option<usize>) -> Result<(), PersistenceError> {
    match limit {
        Some(limit) if value.len() > limit => Err(PersistenceError::QuotaExceeded {
            key: key.to_string(),
            size: value.len(),
            limit,
        }),
        _ => Ok(()),
    }
}

/// Key-value table in a SQLite database
pub struct SqliteKv {
    base_path: PathBuf,
    db: Connection,
    max_value_bytes: Option<usize>,
}

impl SqliteKv {
    /// Open or create the backend in `dir`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, PersistenceError> {
        let base_path = dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        let db = Connection::open(base_path.join(DB_FILE_NAME))?;
        let kv = Self {
            base_path,
            db,
            max_value_bytes: None,
        };
        kv.create_schema()?;

        Ok(kv)
    }

    /// Reject values larger than `limit` bytes
    pub fn with_quota(mut self, limit: Option<usize>) -> Self {
        self.max_value_bytes = limit;
        self
    }

    /// Get the directory holding the database file
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn create_schema(&self) -> Result<(), PersistenceError> {
        debug!("Creating key-value schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

impl KvBackend for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let value = self
            .db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        check_quota(key, value, self.max_value_bytes)?;

        let tx = self.db.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value, chrono::Utc::now().timestamp_millis()],
        )?;
        tx.commit()?;

        debug!(key, bytes = value.len(), "kv set");
        Ok(())
    }
}

/// In-process backend, mainly for tests and demos
#[derive(Debug, Default, Clone)]
pub struct MemoryKv {
    entries: HashMap<String, String>,
    max_value_bytes: Option<usize>,
}

impl MemoryKv {
    /// Create an empty in-memory store with no quota
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject values larger than `limit` bytes
    pub fn with_quota(mut self, limit: Option<usize>) -> Self {
        self.max_value_bytes = limit;
        self
    }
}

impl KvBackend for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        check_quota(key, value, self.max_value_bytes)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
