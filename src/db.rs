//! A thin wrapper around an embedded SQLite database file.
//!
//! Check plugins are short-lived processes, so any state that has to
//! survive between two runs ends up in a small database file, typically
//! below the temp directory. Two overlapping runs may touch the same file;
//! safety then rests entirely on SQLite's own locking, this layer adds no
//! mutex or retry logic of its own.
//!
//! Values are always bound through parameterized queries. Identifiers
//! (table and column names) cannot be bound, so they have to pass
//! [`validate_identifier`] before they are spliced into a statement.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, Params, Row};

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("invalid identifier {0:?}: only letters, digits and underscores are allowed")]
    InvalidIdentifier(String),
    #[error("connecting to database {path} failed: {source}")]
    Open {
        path: String,
        source: rusqlite::Error,
    },
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// Checks that a table or column name consists only of `[A-Za-z0-9_]`.
pub fn validate_identifier(name: &str) -> Result<(), DbError> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return Err(DbError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

/// A connection to a single-file SQLite database. The file is created on
/// open if it does not exist; the connection closes on drop.
pub struct Db {
    conn: Connection,
}

impl Db {
    /// Opens (or creates) the database file with a one second busy timeout,
    /// so a concurrent plugin run holding the write lock does not fail this
    /// one immediately.
    pub fn open(path: impl AsRef<Path>) -> Result<Db, DbError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| DbError::Open {
            path: path.display().to_string(),
            source,
        })?;
        conn.busy_timeout(Duration::from_secs(1))?;
        Ok(Db { conn })
    }

    /// Opens a private in-memory database, useful for tests and throwaway
    /// stores.
    pub fn open_in_memory() -> Result<Db, DbError> {
        Ok(Db {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Creates `table` with the given column definition if it does not
    /// exist yet.
    ///
    /// `definition` is the raw column list, for example
    /// `"key TEXT NOT NULL, value TEXT NOT NULL"`.
    pub fn create_table(&self, table: &str, definition: &str) -> Result<(), DbError> {
        validate_identifier(table)?;
        let sql = format!("CREATE TABLE IF NOT EXISTS \"{table}\" ({definition});");
        self.conn.execute(&sql, [])?;
        Ok(())
    }

    /// Creates an index named `idx_{table}_{column}` if it does not exist
    /// yet.
    pub fn create_index(&self, table: &str, column: &str, unique: bool) -> Result<(), DbError> {
        validate_identifier(table)?;
        validate_identifier(column)?;
        let create = if unique {
            "CREATE UNIQUE INDEX"
        } else {
            "CREATE INDEX"
        };
        let sql =
            format!("{create} IF NOT EXISTS idx_{table}_{column} ON \"{table}\" ({column});");
        self.conn.execute(&sql, [])?;
        Ok(())
    }

    /// Executes a single INSERT/REPLACE/DELETE/UPDATE statement and returns
    /// the number of affected rows.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize, DbError> {
        Ok(self.conn.execute(sql, params)?)
    }

    /// Runs a query expected to return at most one row and maps it with
    /// `map`; `None` if the query matched nothing.
    pub fn query_row<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Option<T>, DbError>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        Ok(self.conn.query_row(sql, params, map).optional()?)
    }

    /// Keeps only the newest `keep` records of `table`, using the SQLite
    /// built-in rowid. Returns the number of deleted rows.
    pub fn cut(&self, table: &str, keep: i64) -> Result<usize, DbError> {
        validate_identifier(table)?;
        let sql = format!(
            "DELETE FROM \"{table}\" WHERE rowid IN (
                SELECT rowid FROM \"{table}\" ORDER BY rowid DESC LIMIT -1 OFFSET ?1
            );"
        );
        Ok(self.conn.execute(&sql, [keep])?)
    }

    pub fn drop_table(&self, table: &str) -> Result<(), DbError> {
        validate_identifier(table)?;
        let sql = format!("DROP TABLE IF EXISTS \"{table}\";");
        self.conn.execute(&sql, [])?;
        Ok(())
    }

    /// Lists all user tables in the database.
    pub fn tables(&self) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%';",
        )?;
        let names = stmt.query_map([], |row| row.get(0))?;
        let mut tables = Vec::new();
        for name in names {
            tables.push(name?);
        }
        Ok(tables)
    }
}
