//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and implement
//! [`Default`] with production values. Every section is `#[serde(default)]`,
//! so a partial JSON file only needs the keys it overrides.

mod database;
mod logging;
mod reader;

pub use database::*;
pub use logging::*;
pub use reader::*;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type for the ledger event store.
///
/// ```json
/// {
///   "database": { "path": "/var/lib/ledger/events.db", "poolSize": 5 },
///   "reader": { "batchSize": 100 },
///   "logging": { "level": "info" }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerSettings {
    /// Database file and connection pool settings.
    pub database: DatabaseSettings,
    /// Read pagination settings.
    pub reader: ReaderSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl LedgerSettings {
    /// Reject values the repository cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "database.path must not be empty".into(),
            ));
        }
        if self.database.pool_size == 0 {
            return Err(SettingsError::InvalidValue(
                "database.poolSize must be at least 1".into(),
            ));
        }
        if self.reader.batch_size == 0 {
            return Err(SettingsError::InvalidValue(
                "reader.batchSize must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
