use anyhow::{anyhow, Context, Result};
use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

use super::migrations;

/// Handle to the embedded session store.
///
/// Owns the single SQLite connection. Every operation holds the lock for the
/// duration of one statement or transaction, so writes to the same row are
/// serialized.
pub struct SessionStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SessionStore {
    /// Open (or create) the store at `db_path` and bring its schema up to date.
    pub fn open(db_path: &Path, busy_timeout: Duration) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let mut conn = Connection::open(db_path).context("Failed to open database connection")?;
        conn.busy_timeout(busy_timeout)
            .context("Failed to set database busy timeout")?;

        let applied = migrations::run_migrations(&mut conn)?;
        info!(
            "Session store ready at {:?} ({} migration(s) applied)",
            db_path, applied
        );

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path.to_path_buf()),
        })
    }

    /// Fresh in-memory store, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        migrations::run_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow!("Failed to lock database connection: {}", e))?;
        f(&conn)
    }

    /// Run `f` inside one transaction, committed only if `f` succeeds.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| anyhow!("Failed to lock database connection: {}", e))?;
        let tx = conn.transaction().context("Failed to begin transaction")?;
        let value = f(&tx)?;
        tx.commit().context("Failed to commit transaction")?;
        Ok(value)
    }

    pub fn schema_version(&self) -> Result<i64> {
        self.with_connection(migrations::current_version)
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }
}
