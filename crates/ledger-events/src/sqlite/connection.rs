//! `SQLite` connection pool with WAL mode and a busy timeout.
//!
//! Uses `r2d2` connection pooling with the `r2d2_sqlite` backend.
//! The [`PragmaCustomizer`] runs on each new connection. `busy_timeout`
//! matters here: competing `BEGIN IMMEDIATE` appends wait on it instead of
//! failing with `SQLITE_BUSY`.

use std::time::Duration;

use ledger_settings::DatabaseSettings;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use uuid::Uuid;

use crate::errors::{EventStoreError, Result};

/// Alias for the connection pool type.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Alias for a pooled connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Configuration for the connection pool.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Maximum pool size (default: 5).
    pub pool_size: u32,
    /// Busy timeout in milliseconds (default: 30000).
    pub busy_timeout_ms: u32,
    /// Cache size in KiB (default: 8192 = 8 MB).
    pub cache_size_kib: i64,
    /// Wait for a free connection before failing (default: 5 s).
    pub connection_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            pool_size: 5,
            busy_timeout_ms: 30_000,
            cache_size_kib: 8192,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&DatabaseSettings> for ConnectionConfig {
    fn from(settings: &DatabaseSettings) -> Self {
        Self {
            pool_size: settings.pool_size,
            busy_timeout_ms: settings.busy_timeout_ms,
            cache_size_kib: settings.cache_size_kib,
            connection_timeout: Duration::from_millis(settings.connection_timeout_ms),
        }
    }
}

/// `SQLite` pragma customizer that runs on each new connection.
#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout_ms: u32,
    cache_size_kib: i64,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(&format!(
            "PRAGMA busy_timeout = {};\
             PRAGMA journal_mode = WAL;\
             PRAGMA cache_size = -{};\
             PRAGMA synchronous = NORMAL;",
            self.busy_timeout_ms, self.cache_size_kib
        ))?;
        Ok(())
    }
}

/// Create an in-memory connection pool (for testing).
///
/// Every pooled connection opens the same uniquely named shared-cache
/// database, so rows written through one connection are visible to the rest.
/// The database lives only while some connection to it is open, so the pool
/// pins one: `min_idle = 1` with no idle timeout and no max lifetime, which
/// keeps the reaper from closing the last connection. Further connections
/// open lazily so they are never set up concurrently against the shared cache.
pub fn new_in_memory(config: &ConnectionConfig) -> Result<ConnectionPool> {
    let uri = format!("file:ledger-{}?mode=memory&cache=shared", Uuid::now_v7());
    build_pool(SqliteConnectionManager::file(uri), config, true)
}

/// Create a file-backed connection pool.
pub fn new_file(path: &str, config: &ConnectionConfig) -> Result<ConnectionPool> {
    build_pool(SqliteConnectionManager::file(path), config, false)
}

fn build_pool(
    manager: SqliteConnectionManager,
    config: &ConnectionConfig,
    pin_connection: bool,
) -> Result<ConnectionPool> {
    let mut builder = Pool::builder()
        .max_size(config.pool_size)
        .connection_timeout(config.connection_timeout)
        .connection_customizer(Box::new(PragmaCustomizer {
            busy_timeout_ms: config.busy_timeout_ms,
            cache_size_kib: config.cache_size_kib,
        }));
    if pin_connection {
        builder = builder
            .min_idle(Some(1))
            .max_lifetime(None)
            .idle_timeout(None);
    } else {
        builder = builder.min_idle(None);
    }
    Ok(builder.build(manager)?)
}

/// Verify pragmas are set correctly on a connection.
pub fn verify_pragmas(conn: &Connection) -> Result<PragmaState> {
    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .map_err(EventStoreError::Sqlite)?;
    let busy_timeout_ms: u32 = conn
        .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
        .map_err(EventStoreError::Sqlite)?;
    Ok(PragmaState {
        journal_mode,
        busy_timeout_ms,
    })
}

/// Pragma state for verification.
#[derive(Debug)]
pub struct PragmaState {
    /// Journal mode ("wal" for files, "memory" for in-memory databases).
    pub journal_mode: String,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_pool_creates_successfully() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        let pragmas = verify_pragmas(&conn).unwrap();
        assert_eq!(pragmas.journal_mode, "memory");
        assert_eq!(pragmas.busy_timeout_ms, 30_000);
    }

    #[test]
    fn in_memory_pool_is_never_reaped() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        assert_eq!(pool.min_idle(), Some(1));
        assert_eq!(pool.max_lifetime(), None);
        assert_eq!(pool.idle_timeout(), None);
    }

    #[test]
    fn file_pool_keeps_default_recycling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recycle.db");
        let pool = new_file(path.to_str().unwrap(), &ConnectionConfig::default())
            .unwrap();
        assert!(pool.max_lifetime().is_some());
        assert!(pool.idle_timeout().is_some());
    }

    #[test]
    fn in_memory_connections_share_one_database() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let a = pool.get().unwrap();
        let b = pool.get().unwrap();
        a.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1);")
            .unwrap();
        let n: i64 = b
            .query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn separate_in_memory_pools_are_isolated() {
        let first = new_in_memory(&ConnectionConfig::default()).unwrap();
        let second = new_in_memory(&ConnectionConfig::default()).unwrap();
        first
            .get()
            .unwrap()
            .execute_batch("CREATE TABLE only_here (x INTEGER);")
            .unwrap();
        let found: i64 = second
            .get()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'only_here'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(found, 0);
    }

    #[test]
    fn file_pool_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let pool = new_file(path.to_str().unwrap(), &ConnectionConfig::default())
            .unwrap();
        let conn = pool.get().unwrap();
        let pragmas = verify_pragmas(&conn).unwrap();
        assert_eq!(pragmas.journal_mode, "wal");
    }

    #[test]
    fn config_from_settings() {
        let settings = DatabaseSettings {
            pool_size: 2,
            busy_timeout_ms: 1_000,
            connection_timeout_ms: 250,
            ..Default::default()
        };
        let config = ConnectionConfig::from(&settings);
        assert_eq!(config.pool_size, 2);
        assert_eq!(config.busy_timeout_ms, 1_000);
        assert_eq!(config.connection_timeout, Duration::from_millis(250));

        let pool = new_in_memory(&config).unwrap();
        assert_eq!(pool.max_size(), 2);
    }

    #[test]
    fn default_config_values() {
        let config = ConnectionConfig::default();
        assert_eq!(config.pool_size, 5);
        assert_eq!(config.busy_timeout_ms, 30_000);
        assert_eq!(config.cache_size_kib, 8192);
    }
}
