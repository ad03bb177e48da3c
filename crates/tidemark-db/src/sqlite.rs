use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tidemark_common::{Error, Result, Version};
use tracing::{debug, info};

use crate::store::DataStore;

/// SQLite-backed data store. The version ledger lives in a single-row
/// `tidemark_version` table next to whatever the migrations create.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("opening data store at {}", db_path.display());
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Database(format!("failed to open database: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_ledger_table()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_ledger_table()?;
        Ok(store)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Database("data store lock poisoned".into()))
    }

    fn ensure_ledger_table(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tidemark_version (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                version INTEGER NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .map_err(|e| Error::Database(format!("failed to create version table: {e}")))?;
        Ok(())
    }

    /// When the ledger was last written, if it has been written at all.
    pub fn updated_at(&self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.connection()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT updated_at FROM tidemark_version WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::Database(format!("failed to read version timestamp: {e}")))?;

        Ok(raw.map(parse_datetime))
    }

    /// Run a single-value `SELECT COUNT(*) ...` style query.
    pub fn query_count(&self, sql: &str) -> Result<i64> {
        let conn = self.connection()?;
        conn.query_row(sql, [], |row| row.get(0))
            .map_err(|e| Error::Database(format!("failed to run count query: {e}")))
    }
}

impl DataStore for SqliteStore {
    fn current_version(&self) -> Result<Version> {
        let conn = self.connection()?;
        let version: Option<Version> = conn
            .query_row(
                "SELECT version FROM tidemark_version WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::Database(format!("failed to read current version: {e}")))?;

        Ok(version.unwrap_or(0))
    }

    fn set_current_version(&self, version: Version) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO tidemark_version (id, version, updated_at)
             VALUES (1, ?1, datetime('now'))
             ON CONFLICT(id) DO UPDATE SET
                version = excluded.version,
                updated_at = excluded.updated_at",
            params![version],
        )
        .map_err(|e| Error::Database(format!("failed to record version {version}: {e}")))?;
        debug!("ledger set to {version}");
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute("DELETE FROM tidemark_version", [])
            .map_err(|e| Error::Database(format!("failed to reset version: {e}")))?;
        debug!("ledger reset");
        Ok(())
    }

    /// Runs `script` inside a transaction opened here. Scripts that issue
    /// their own `BEGIN` fail with a database error and change nothing.
    fn execute(&self, script: &str) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(format!("failed to start transaction: {e}")))?;
        tx.execute_batch(script)
            .map_err(|e| Error::Database(format!("script failed: {e}")))?;
        tx.commit()
            .map_err(|e| Error::Database(format!("failed to commit script: {e}")))?;
        Ok(())
    }
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| {
            // SQLite datetime('now') produces "YYYY-MM-DD HH:MM:SS"
            NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
                .map(|naive| naive.and_utc())
                .unwrap_or_else(|_| Utc::now())
        })
}
