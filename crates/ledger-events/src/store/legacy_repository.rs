//! The legacy single-table event repository.
//!
//! [`LegacyEventRepository`] is a stateless façade over a connection pool.
//! Appends run as one `BEGIN IMMEDIATE` transaction, so the expected-version
//! check and the inserts happen under `SQLite`'s write lock and competing
//! writers (threads or processes) are serialized by the database itself.
//! Reads are lazy and fetch one keyset page per query.

use std::path::Path;

use ledger_core::EventId;
use ledger_settings::LedgerSettings;
use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info, instrument};

use crate::errors::{EventStoreError, Result};
use crate::specification::{Direction, ReadSpecification, ReadStart};
use crate::sqlite::connection::{
    ConnectionConfig, ConnectionPool, PooledConnection, new_file, new_in_memory,
};
use crate::sqlite::migrations::run_migrations;
use crate::sqlite::repositories::event::{LegacyEventRepo, PageQuery, is_unique_violation};
use crate::sqlite::row_types::LegacyEventRow;
use crate::store::reader::{Batches, Pager, Position, Records};
use crate::types::{EventRecord, ExpectedVersion, Stream, StreamName};

/// Rows fetched per query when neither the repository nor the read
/// specification sets a batch size.
pub const DEFAULT_BATCH_SIZE: usize = 100;

const AUTO_NOT_SUPPORTED: &str = ":auto mode is not supported by LegacyEventRepository";

/// Event repository backed by the single `event_store_events` table.
#[derive(Clone)]
pub struct LegacyEventRepository {
    pool: ConnectionPool,
    batch_size: usize,
}

impl LegacyEventRepository {
    /// Wrap an existing pool. The schema must already be migrated.
    pub fn new(pool: ConnectionPool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the default rows per query for reads that don't choose one.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Open (creating if needed) the database described by `settings` and
    /// apply pending migrations.
    pub fn open(settings: &LedgerSettings) -> Result<Self> {
        let path = &settings.database.path;
        let parent = Path::new(path).parent();
        if let Some(parent) = parent.filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let pool = new_file(path, &ConnectionConfig::from(&settings.database))?;
        let applied = run_migrations(&*pool.get()?)?;
        info!(path = %path, applied, "event repository opened");

        Ok(Self::new(pool).with_batch_size(settings.reader.batch_size))
    }

    /// Open using settings loaded from `~/.ledger/settings.json` and `LEDGER_*`.
    pub fn open_default() -> Result<Self> {
        let settings = ledger_settings::load_settings()?;
        Self::open(&settings)
    }

    /// Fresh migrated in-memory repository.
    pub fn in_memory() -> Result<Self> {
        let pool = new_in_memory(&ConnectionConfig::default())?;
        let _ = run_migrations(&*pool.get()?)?;
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────

    /// Append `records` to `stream`, in order, all or nothing.
    ///
    /// `ExpectedVersion::Auto` is always rejected, and the global stream only
    /// accepts `ExpectedVersion::Any`. Both checks happen before any database
    /// access. An empty batch still runs the version check.
    #[instrument(
        skip(self, records),
        fields(stream = %stream, count = records.len(), expected = %expected_version)
    )]
    pub fn append_to_stream(
        &self,
        records: &[EventRecord],
        stream: &Stream,
        expected_version: ExpectedVersion,
    ) -> Result<()> {
        if expected_version == ExpectedVersion::Auto {
            return Err(EventStoreError::InvalidExpectedVersion(
                AUTO_NOT_SUPPORTED.into(),
            ));
        }
        if stream.is_global() && expected_version != ExpectedVersion::Any {
            return Err(EventStoreError::InvalidExpectedVersion(format!(
                "expected version {expected_version} not allowed on the global stream, use any"
            )));
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        check_expected_version(&tx, stream, expected_version)?;

        for record in records {
            LegacyEventRepo::insert(&tx, stream.storage_key(), record)
                .map_err(|e| duplicate_in(stream, e))?;
        }

        tx.commit()?;
        debug!("events appended");
        Ok(())
    }

    /// Linking events into additional streams needs a many-to-many table,
    /// which the single-table layout doesn't have.
    #[allow(clippy::unused_self)]
    #[instrument(
        skip(self, event_ids, _expected_version),
        fields(stream = %stream, count = event_ids.len())
    )]
    pub fn link_to_stream(
        &self,
        event_ids: &[EventId],
        stream: &Stream,
        _expected_version: ExpectedVersion,
    ) -> Result<()> {
        Err(EventStoreError::NotSupported(
            "link_to_stream is not supported by LegacyEventRepository".into(),
        ))
    }

    /// Move every event of `stream` into the catch-all. Returns rows moved.
    ///
    /// Events stay in the global log at their original positions. Deleting
    /// the global stream is a no-op.
    #[instrument(skip(self), fields(stream = %stream))]
    pub fn delete_stream(&self, stream: &Stream) -> Result<usize> {
        let Stream::Named(name) = stream else {
            debug!("global stream cannot be deleted, skipping");
            return Ok(0);
        };
        let conn = self.conn()?;
        let moved = LegacyEventRepo::reassign_to_global(&conn, name.as_str())?;
        debug!(moved, "stream deleted");
        Ok(moved)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────

    /// Lazily read the records described by `spec`.
    ///
    /// Fails up front with [`EventStoreError::InvalidPageSize`] for a zero
    /// limit or batch size and with [`EventStoreError::EventNotFound`] for an
    /// unknown start event.
    #[instrument(skip_all, fields(stream = %spec.stream, direction = ?spec.direction))]
    pub fn read(&self, spec: &ReadSpecification) -> Result<Records> {
        Ok(Records::new(self.pager(spec)?))
    }

    /// Like [`read`](Self::read), but yields whole pages.
    #[instrument(skip_all, fields(stream = %spec.stream, direction = ?spec.direction))]
    pub fn read_batches(&self, spec: &ReadSpecification) -> Result<Batches> {
        Ok(Batches::new(self.pager(spec)?))
    }

    /// Number of records `read(spec)` would yield.
    pub fn count(&self, spec: &ReadSpecification) -> Result<u64> {
        let _ = self.batch_size_for(spec)?;
        let conn = self.conn()?;
        let after_id = match resolve_start(&conn, &spec.start, spec.direction)? {
            Position::End => return Ok(0),
            Position::Start => None,
            Position::After(id) => Some(id),
        };
        let stream = stream_filter(&spec.stream);
        let matching = LegacyEventRepo::count_matching(
            &conn,
            &PageQuery {
                stream: stream.as_deref(),
                direction: spec.direction,
                after_id,
                limit: None,
            },
        )?;
        let Some(limit) = spec.limit else {
            return Ok(matching);
        };
        Ok(matching.min(u64::try_from(limit).unwrap_or(u64::MAX)))
    }

    /// Whether an event with this id is stored.
    pub fn has_event(&self, event_id: &EventId) -> Result<bool> {
        LegacyEventRepo::exists(&*self.conn()?, event_id.as_str())
    }

    /// Fetch a single event.
    pub fn read_event(&self, event_id: &EventId) -> Result<EventRecord> {
        LegacyEventRepo::get_by_event_id(&*self.conn()?, event_id.as_str())?
            .ok_or_else(|| EventStoreError::EventNotFound(event_id.to_string()))?
            .into_record()
    }

    /// Newest event of `stream` (of the whole log for `Stream::Global`).
    pub fn last_stream_event(&self, stream: &Stream) -> Result<Option<EventRecord>> {
        let filter = stream_filter(stream);
        LegacyEventRepo::last_in_stream(&*self.conn()?, filter.as_deref())?
            .map(LegacyEventRow::into_record)
            .transpose()
    }

    /// Streams currently holding the event, never including the catch-all.
    /// Empty for an unknown id.
    pub fn streams_of(&self, event_id: &EventId) -> Result<Vec<StreamName>> {
        LegacyEventRepo::streams_of(&*self.conn()?, event_id.as_str())?
            .into_iter()
            .map(StreamName::new)
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────────────

    fn pager(&self, spec: &ReadSpecification) -> Result<Pager> {
        let batch_size = self.batch_size_for(spec)?;
        let position = resolve_start(&*self.conn()?, &spec.start, spec.direction)?;
        Ok(Pager::new(
            self.pool.clone(),
            stream_filter(&spec.stream),
            spec.direction,
            position,
            spec.limit,
            batch_size,
        ))
    }

    fn batch_size_for(&self, spec: &ReadSpecification) -> Result<usize> {
        if spec.limit == Some(0) {
            return Err(EventStoreError::InvalidPageSize(
                "limit must be greater than 0".into(),
            ));
        }
        let batch_size = spec.batch_size.unwrap_or(self.batch_size);
        if batch_size == 0 {
            return Err(EventStoreError::InvalidPageSize(
                "batch size must be greater than 0".into(),
            ));
        }
        Ok(batch_size)
    }
}

fn check_expected_version(
    conn: &Connection,
    stream: &Stream,
    expected: ExpectedVersion,
) -> Result<()> {
    let Some(required) = expected.required_len() else {
        return Ok(());
    };
    let actual = LegacyEventRepo::count_in_stream(conn, stream.storage_key())?;
    if actual == required {
        return Ok(());
    }
    Err(EventStoreError::WrongExpectedEventVersion {
        stream: stream.to_string(),
        expected: expected.to_string(),
        actual: ExpectedVersion::describe_len(actual),
    })
}

/// `Tail` is past the newest row: empty going forward, newest first going
/// backward.
fn resolve_start(conn: &Connection, start: &ReadStart, direction: Direction) -> Result<Position> {
    match (start, direction) {
        (ReadStart::Head, _) | (ReadStart::Tail, Direction::Backward) => Ok(Position::Start),
        (ReadStart::Tail, Direction::Forward) => Ok(Position::End),
        (ReadStart::After(event_id), _) => {
            let row_id = LegacyEventRepo::row_id_of(conn, event_id.as_str())?;
            row_id
                .map(Position::After)
                .ok_or_else(|| EventStoreError::EventNotFound(event_id.to_string()))
        }
    }
}

/// A unique index violation during an append means the event id is taken.
fn duplicate_in(stream: &Stream, err: EventStoreError) -> EventStoreError {
    if is_unique_violation(&err) {
        EventStoreError::EventDuplicatedInStream {
            stream: stream.to_string(),
        }
    } else {
        err
    }
}

/// Stream column value to filter on; the global stream reads every row.
fn stream_filter(stream: &Stream) -> Option<String> {
    match stream {
        Stream::Global => None,
        Stream::Named(name) => Some(name.as_str().to_string()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
