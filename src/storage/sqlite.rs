//! SQLite storage implementation
//!
//! Connection handling, schema setup and statistics. The per-record
//! operations live in sibling modules as further `impl SqliteStore` blocks.

use super::schema;
use crate::{Config, Result};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed storage for all lab records
pub struct SqliteStore {
    pub(crate) conn: Connection,
    prefix: String,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist) with the default prefix
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_prefix(path, schema::DEFAULT_PREFIX)
    }

    /// Open the database a configuration points at
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open_with_prefix(&config.database, &config.db_prefix)
    }

    pub fn open_with_prefix(path: &Path, prefix: &str) -> Result<Self> {
        schema::check_prefix(prefix)?;
        debug!(path = %path.display(), prefix, "opening database");
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::init(conn, prefix)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, schema::DEFAULT_PREFIX)
    }

    fn init(conn: Connection, prefix: &str) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        let store = Self { conn, prefix: prefix.to_string() };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements(&self.prefix) {
            self.conn.execute(&stmt, [])?;
        }
        Ok(())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Prefixed table name
    pub(crate) fn table(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    fn count_rows(&self, table: &str) -> Result<usize> {
        let count: i64 =
            self.conn.query_row(&format!("SELECT COUNT(*) FROM {}", self.table(table)), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// True when no molecules, experiments or projects have been stored yet
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.count_rows("molecules")? == 0
            && self.count_rows("experiments")? == 0
            && self.count_rows("project")? == 0)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let tables = schema::TABLES
            .iter()
            .map(|&name| Ok(TableCount { name, rows: self.count_rows(name)? }))
            .collect::<Result<Vec<_>>>()?;
        Ok(DbStats { prefix: self.prefix.clone(), tables })
    }
}

/// Row count of one table
#[derive(Debug, Clone, serde::Serialize)]
pub struct TableCount {
    pub name: &'static str,
    pub rows: usize,
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub prefix: String,
    pub tables: Vec<TableCount>,
}

impl DbStats {
    pub fn rows(&self, table: &str) -> Option<usize> {
        self.tables.iter().find(|t| t.name == table).map(|t| t.rows)
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics (prefix '{}'):", self.prefix)?;
        for t in &self.tables {
            writeln!(f, "  {}: {}", t.name, t.rows)?;
        }
        write!(f, "  Total: {}", self.total_rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_store_stats() {
        let store = SqliteStore::open_in_memory().unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.tables.len(), schema::TABLES.len());
        assert_eq!(stats.total_rows(), 0);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let store = SqliteStore::open_in_memory().unwrap();
        let on: i64 = store.conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)).unwrap();
        assert_eq!(on, 1);
    }

    #[test]
    fn test_file_store_with_custom_prefix() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lab.db");
        {
            let store = SqliteStore::open_with_prefix(&path, "lab_").unwrap();
            assert_eq!(store.table("molecules"), "lab_molecules");
        }
        // Reopening is idempotent
        let store = SqliteStore::open_with_prefix(&path, "lab_").unwrap();
        let n: i64 = store
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name LIKE 'lab_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(n as usize, schema::TABLES.len());
    }

    #[test]
    fn test_bad_prefix_rejected() {
        let dir = TempDir::new().unwrap();
        let result = SqliteStore::open_with_prefix(&dir.path().join("x.db"), "bad prefix");
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }
}
