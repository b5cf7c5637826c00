//! SQLite-backed domain store.

use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::store::{DomainRecord, DomainStore, StoreError, StoreResult};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS domains (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        domain TEXT UNIQUE NOT NULL,
        campaign_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS domains_created_at_idx ON domains(created_at);
";

const COLUMNS: &str = "id, domain, campaign_id, created_at, updated_at";

/// Store holding a single SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "Opened SQLite database");
        Self::init(conn)
    }

    /// Private in-memory database, used by tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<DomainRecord> {
    Ok(DomainRecord {
        id: row.get(0)?,
        domain: row.get(1)?,
        campaign_id: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn conflict_or(err: rusqlite::Error, domain: &str) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            StoreError::Conflict(domain.to_string())
        }
        _ => StoreError::Sqlite(err),
    }
}

impl DomainStore for SqliteStore {
    fn get(&self, domain: &str) -> StoreResult<Option<DomainRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM domains WHERE domain = ?1"),
                params![domain],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn get_by_id(&self, id: i64) -> StoreResult<Option<DomainRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM domains WHERE id = ?1"),
                params![id],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn upsert_by_domain(&self, domain: &str, campaign_id: &str) -> StoreResult<DomainRecord> {
        let conn = self.conn()?;
        let now = Utc::now();
        let record = conn.query_row(
            &format!(
                "INSERT INTO domains (domain, campaign_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)
                 ON CONFLICT(domain) DO UPDATE SET
                     campaign_id = excluded.campaign_id,
                     updated_at = excluded.updated_at
                 RETURNING {COLUMNS}"
            ),
            params![domain, campaign_id, now],
            row_to_record,
        )?;
        Ok(record)
    }

    fn update_by_id(&self, id: i64, domain: &str, campaign_id: &str) -> StoreResult<bool> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE domains SET domain = ?1, campaign_id = ?2, updated_at = ?3 WHERE id = ?4",
                params![domain, campaign_id, Utc::now(), id],
            )
            .map_err(|e| conflict_or(e, domain))?;
        Ok(changed > 0)
    }

    fn delete_by_id(&self, id: i64) -> StoreResult<bool> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM domains WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn list_all(&self) -> StoreResult<Vec<DomainRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM domains ORDER BY created_at DESC, id DESC"
        ))?;
        let records = stmt
            .query_map([], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn count(&self) -> StoreResult<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM domains", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
