//! Error types for the event repository.
//!
//! [`EventStoreError`] is returned by every repository operation. Domain
//! failures (version conflicts, duplicates, unsupported operations) have
//! their own variants so callers can match on them; infrastructure errors
//! are wrapped with `#[from]`.

use ledger_settings::SettingsError;
use thiserror::Error;

/// Errors that can occur during event repository operations.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON serialization/deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A stored timestamp could not be parsed.
    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    /// Filesystem error while preparing the database location.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings could not be loaded.
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// The expected version mode is not usable for this call.
    #[error("invalid expected version: {0}")]
    InvalidExpectedVersion(String),

    /// The stream did not have the expected version at append time.
    #[error("wrong expected version for stream {stream}: expected {expected}, actual {actual}")]
    WrongExpectedEventVersion {
        /// Stream that was appended to.
        stream: String,
        /// Expected version supplied by the caller.
        expected: String,
        /// Version actually found in storage.
        actual: String,
    },

    /// An event id in the batch is already stored.
    #[error("event duplicated in stream {stream}")]
    EventDuplicatedInStream {
        /// Stream that was appended to.
        stream: String,
    },

    /// The operation is not available on this repository.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Requested event was not found.
    #[error("event not found: {0}")]
    EventNotFound(String),

    /// A stream name was rejected.
    #[error("incorrect stream data: {0}")]
    IncorrectStreamData(String),

    /// A read limit or batch size was zero.
    #[error("invalid page size: {0}")]
    InvalidPageSize(String),
}

/// Convenience type alias for event repository results.
pub type Result<T> = std::result::Result<T, EventStoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
