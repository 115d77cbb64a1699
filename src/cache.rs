//! A key-value store with optional expiry, backed by a SQLite file.
//!
//! Check plugins run as independent short-lived processes, so anything
//! worth reusing between runs (session tokens, login cookies, expensive
//! lookups) goes through this cache. It is strictly best-effort: a broken
//! or unwritable cache file behaves like an empty cache and never fails
//! the check itself.
//!
//! ```rust,no_run
//! use checklib::{now, Cache};
//!
//! let cache = Cache::open_default().unwrap();
//! let token = match cache.get("session-token") {
//!     Some(token) => token,
//!     None => {
//!         let token = String::from("fresh token from a login round trip");
//!         cache.set("session-token", &token, now() + 300);
//!         token
//!     }
//! };
//! ```

use std::path::Path;

use crate::db::{Db, DbError};
use crate::now;

/// File name used by [`Cache::open_default`] and [`Cache::open_in`].
pub const DEFAULT_CACHE_FILENAME: &str = "checklib-cache.db";

const TABLE: &str = "cache";
const DEFINITION: &str = "key TEXT NOT NULL, value TEXT NOT NULL, timestamp INT NOT NULL";

/// One stored record. A `timestamp` of 0 means the entry never expires,
/// anything else is the absolute unix time after which it is stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub timestamp: i64,
}

/// The cache itself: one SQLite file holding a single `cache` table with a
/// unique key column. The table is created lazily on the first
/// [`Cache::set`]. Concurrent plugin runs may share the file; SQLite's own
/// locking is the only coordination.
pub struct Cache {
    db: Db,
}

impl Cache {
    /// Opens the cache under the given file path, creating the file if
    /// needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Cache, DbError> {
        Ok(Cache {
            db: Db::open(path)?,
        })
    }

    /// Opens [`DEFAULT_CACHE_FILENAME`] in the given directory.
    pub fn open_in(dir: impl AsRef<Path>) -> Result<Cache, DbError> {
        Cache::open(dir.as_ref().join(DEFAULT_CACHE_FILENAME))
    }

    /// Opens [`DEFAULT_CACHE_FILENAME`] in the system temp directory.
    pub fn open_default() -> Result<Cache, DbError> {
        Cache::open_in(std::env::temp_dir())
    }

    /// Returns the value stored under `key`, or `None` if the key does not
    /// exist, has expired, or the cache cannot be read.
    pub fn get(&self, key: &str) -> Option<String> {
        self.get_entry(key).map(|entry| entry.value)
    }

    /// Like [`Cache::get`], but returns the whole record including the
    /// expiry timestamp.
    pub fn get_entry(&self, key: &str) -> Option<CacheEntry> {
        match self.lookup(key) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(key, "cache lookup failed: {err}");
                None
            }
        }
    }

    fn lookup(&self, key: &str) -> Result<Option<CacheEntry>, DbError> {
        let entry = self.db.query_row(
            "SELECT key, value, timestamp FROM cache WHERE key = ?1;",
            [key],
            |row| {
                Ok(CacheEntry {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    timestamp: row.get(2)?,
                })
            },
        )?;
        let Some(entry) = entry else {
            return Ok(None);
        };

        if entry.timestamp != 0 && entry.timestamp <= now() {
            // The hit is stale; sweep every expired row while we are at it.
            // Entries with timestamp 0 never expire and are left alone.
            self.db.execute(
                "DELETE FROM cache WHERE timestamp != 0 AND timestamp <= ?1;",
                [now()],
            )?;
            return Ok(None);
        }
        Ok(Some(entry))
    }

    /// Stores `value` under `key`, overwriting any previous value and
    /// expiry. An `expire` of 0 keeps the entry forever, anything else is
    /// the absolute unix time after which [`Cache::get`] stops returning
    /// it. Returns whether the write went through.
    pub fn set(&self, key: &str, value: &str, expire: i64) -> bool {
        match self.store(key, value, expire) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(key, "cache write failed: {err}");
                false
            }
        }
    }

    fn store(&self, key: &str, value: &str, expire: i64) -> Result<(), DbError> {
        self.db.create_table(TABLE, DEFINITION)?;
        self.db.create_index(TABLE, "key", true)?;
        self.db.execute(
            "REPLACE INTO cache (key, value, timestamp) VALUES (?1, ?2, ?3);",
            rusqlite::params![key, value, expire],
        )?;
        Ok(())
    }
}
