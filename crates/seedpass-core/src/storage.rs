//! Persistence port for the vault document
//!
//! The vault only needs a string-valued key-value slot: read it, overwrite
//! it. [`SecretStore`] is that capability; [`SqliteStore`] backs it with a
//! SQLite `slots` table and [`MemoryStore`] keeps it in process memory.
//!
//! `SqliteStore` runs every query on tokio's blocking pool, so it needs a
//! tokio runtime; `MemoryStore` works under any executor.
//!
//! Neither backend provides transactions across a get/set pair. Callers that
//! read-modify-write the same slot are responsible for their own ordering.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection};
use thiserror::Error;

/// Errors from storage backends
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage lock poisoned")]
    Poisoned,

    #[error("Storage task failed: {0}")]
    Task(String),
}

/// A named-slot string store.
///
/// Both operations are suspension points; implementations may do real I/O.
pub trait SecretStore {
    /// Read a slot. `Ok(None)` if it was never written.
    fn get(&self, slot: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Overwrite a slot (upsert).
    fn set(&self, slot: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Process-local store. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemoryStore {
    async fn get(&self, slot: &str) -> Result<Option<String>, StorageError> {
        let slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(slots.get(slot).cloned())
    }

    async fn set(&self, slot: &str, value: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        slots.insert(slot.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// SQLite backend
// ============================================================================

/// SQLite-backed store: one row per slot in a `slots (key, value)` table.
///
/// Queries run through `spawn_blocking` so disk I/O never stalls the
/// executor thread.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating missing parent
    /// directories.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL mode so a reader never blocks on the single writer
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Self::migrate(conn)
    }

    /// Open a throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::migrate(Connection::open_in_memory()?)
    }

    fn migrate(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS slots (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StorageError::Poisoned)?;
            f(&conn)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

impl SecretStore for SqliteStore {
    async fn get(&self, slot: &str) -> Result<Option<String>, StorageError> {
        let slot = slot.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare_cached("SELECT value FROM slots WHERE key = ?1")?;
            let mut rows = stmt.query(params![slot])?;
            match rows.next()? {
                Some(row) => Ok(Some(row.get(0)?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn set(&self, slot: &str, value: &str) -> Result<(), StorageError> {
        let (slot, value) = (slot.to_string(), value.to_string());
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO slots (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![slot, value],
            )?;
            Ok(())
        })
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================
