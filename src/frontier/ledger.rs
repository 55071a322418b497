//! SQLite ledger backing the frontier
//!
//! The ledger records every canonical URL the frontier has accepted and
//! whether it was completed, so an interrupted crawl can pick up where it
//! stopped. In-flight is an in-memory state only: a URL is `pending` in the
//! ledger until it is marked complete.

use crate::frontier::UrlState;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQL schema for the ledger
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS urls (
    url TEXT PRIMARY KEY,
    state TEXT NOT NULL,
    discovered_at TEXT NOT NULL,
    completed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_urls_state ON urls(state);
"#;

/// A persisted frontier entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRecord {
    pub url: String,
    pub state: UrlState,
}

/// SQLite-backed frontier ledger
pub struct Ledger {
    conn: Connection,
}

impl Ledger {
    /// Opens or creates the ledger at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(Ledger)` - Successfully opened/created ledger
    /// * `Err(rusqlite::Error)` - Failed to open database
    pub fn open(path: &Path) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory ledger
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Removes every entry
    pub fn clear(&mut self) -> Result<(), rusqlite::Error> {
        self.conn.execute("DELETE FROM urls", [])?;
        Ok(())
    }

    /// Loads every entry in discovery order
    ///
    /// Unknown states are read back as pending so the URL gets another chance.
    pub fn load(&self) -> Result<Vec<LedgerRecord>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, state FROM urls ORDER BY rowid")?;

        let records = stmt
            .query_map([], |row| {
                let state: String = row.get(1)?;
                Ok(LedgerRecord {
                    url: row.get(0)?,
                    state: UrlState::from_db_string(&state).unwrap_or(UrlState::Pending),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Records a newly accepted URL as pending
    pub fn insert(&mut self, url: &str) -> Result<(), rusqlite::Error> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR IGNORE INTO urls (url, state, discovered_at) VALUES (?1, ?2, ?3)",
            params![url, UrlState::Pending.to_db_string(), now],
        )?;
        Ok(())
    }

    /// Marks a URL complete, inserting it if it was never recorded
    pub fn mark_complete(&mut self, url: &str) -> Result<(), rusqlite::Error> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO urls (url, state, discovered_at, completed_at) VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(url) DO UPDATE SET state = excluded.state, completed_at = excluded.completed_at",
            params![url, UrlState::Complete.to_db_string(), now],
        )?;
        Ok(())
    }

    /// Counts entries in the given state
    pub fn count(&self, state: UrlState) -> Result<usize, rusqlite::Error> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM urls WHERE state = ?1",
            params![state.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
