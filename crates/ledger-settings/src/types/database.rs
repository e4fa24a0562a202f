use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Database file and connection pool settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// Path to the `SQLite` database file.
    pub path: String,
    /// Maximum number of pooled connections.
    pub pool_size: u32,
    /// `PRAGMA busy_timeout` applied to every connection, in milliseconds.
    pub busy_timeout_ms: u32,
    /// `PRAGMA cache_size` applied to every connection, in KiB.
    pub cache_size_kib: i64,
    /// How long to wait for a free pooled connection, in milliseconds.
    pub connection_timeout_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            pool_size: 5,
            busy_timeout_ms: 30_000,
            cache_size_kib: 8192,
            connection_timeout_ms: 5_000,
        }
    }
}

/// `~/.ledger/events.db`, or `/tmp/.ledger/events.db` when `HOME` is unset.
pub fn default_database_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home)
        .join(".ledger")
        .join("events.db")
        .to_string_lossy()
        .into_owned()
}
