//! Persisted cache tier
//!
//! Results outlive the process in a single SQLite file. Payloads are
//! JSON blobs keyed by content hash, with optional expiry and a tag
//! column for group invalidation. The table is kept under a byte
//! budget; when an insert pushes it over, the oldest rows go first.

use crate::error::CacheResult;
use brushline_estimate::CalculationResult;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS cache_entries (
    key        TEXT PRIMARY KEY,
    payload    TEXT NOT NULL,
    tag        TEXT,
    created_at INTEGER NOT NULL,
    expires_at INTEGER,
    bytes      INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_cache_entries_tag ON cache_entries (tag);
CREATE INDEX IF NOT EXISTS idx_cache_entries_created ON cache_entries (created_at);
";

/// Default on-disk budget: 64 MiB of payload
pub const DEFAULT_BYTE_BUDGET: u64 = 64 * 1024 * 1024;

/// SQLite-backed cache tier
pub struct SqliteTier {
    conn: Mutex<Connection>,
    byte_budget: u64,
}

impl SqliteTier {
    /// Open (or create) the cache database at `path`
    pub fn open(path: &Path) -> CacheResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// An in-memory database, used by tests
    pub fn in_memory() -> CacheResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> CacheResult<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION.to_string()],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            byte_budget: DEFAULT_BYTE_BUDGET,
        })
    }

    /// Cap the total payload bytes retained
    pub fn with_byte_budget(mut self, bytes: u64) -> Self {
        self.byte_budget = bytes.max(1);
        self
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch a live entry; expired rows are deleted on the way out
    pub fn get(&self, key: &str) -> CacheResult<Option<CalculationResult>> {
        let conn = self.conn();
        let row: Option<(String, Option<i64>)> = conn
            .query_row(
                "SELECT payload, expires_at FROM cache_entries WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((payload, expires_at)) = row else {
            return Ok(None);
        };

        if expires_at.is_some_and(|at| Utc::now().timestamp() >= at) {
            conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&payload)?))
    }

    /// Store an entry, then trim oldest rows back under the byte budget
    pub fn put(
        &self,
        key: &str,
        tag: Option<&str>,
        value: &CalculationResult,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let payload = serde_json::to_string(value)?;
        let now = Utc::now().timestamp();
        let expires_at = ttl.map(|d| now + d.as_secs() as i64);

        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, payload, tag, created_at, expires_at, bytes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![key, payload, tag, now, expires_at, payload.len() as i64],
        )?;

        // Oldest-first trim until the table fits the budget again. The
        // row just written is never the eviction candidate, so a single
        // oversized payload still gets cached.
        loop {
            let total: i64 = conn.query_row(
                "SELECT COALESCE(SUM(bytes), 0) FROM cache_entries",
                [],
                |row| row.get(0),
            )?;
            if total as u64 <= self.byte_budget {
                break;
            }
            let evicted = conn.execute(
                "DELETE FROM cache_entries WHERE key = (
                     SELECT key FROM cache_entries WHERE key != ?1
                     ORDER BY created_at ASC, key ASC LIMIT 1
                 )",
                params![key],
            )?;
            if evicted == 0 {
                break;
            }
        }

        Ok(())
    }

    /// Delete every row carrying `tag`; returns the number removed
    pub fn invalidate_tag(&self, tag: &str) -> CacheResult<usize> {
        let removed = self
            .conn()
            .execute("DELETE FROM cache_entries WHERE tag = ?1", params![tag])?;
        Ok(removed)
    }

    pub fn remove(&self, key: &str) -> CacheResult<()> {
        self.conn()
            .execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
        Ok(())
    }

    pub fn clear(&self) -> CacheResult<()> {
        self.conn().execute("DELETE FROM cache_entries", [])?;
        Ok(())
    }

    /// Number of rows currently stored
    pub fn len(&self) -> CacheResult<usize> {
        let count: i64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
