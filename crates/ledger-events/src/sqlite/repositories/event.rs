//! Event repository for the legacy `event_store_events` table.
//!
//! Every row carries its own stream name, so stream reads are plain filtered
//! scans ordered by the global `id`. There is no per-stream position column:
//! a stream's version is the number of rows it holds minus one.

use std::fmt::Write;

use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::{EventStoreError, Result};
use crate::specification::Direction;
use crate::sqlite::row_types::LegacyEventRow;
use crate::types::{EventRecord, GLOBAL_STREAM_KEY};

const SELECT_COLUMNS: &str =
    "SELECT id, stream, event_id, event_type, data, metadata, created_at FROM event_store_events";

/// Filter and bounds for one page of a keyset-paginated read.
#[derive(Clone, Copy, Debug)]
pub struct PageQuery<'a> {
    /// Stream column value to match; `None` reads every row.
    pub stream: Option<&'a str>,
    /// Row order.
    pub direction: Direction,
    /// Exclusive keyset cursor on `id`.
    pub after_id: Option<i64>,
    /// Maximum rows to return.
    pub limit: Option<usize>,
}

/// Event repository, stateless, every method takes `&Connection`.
pub struct LegacyEventRepo;

impl LegacyEventRepo {
    /// Insert one record into `stream`.
    ///
    /// The unique index on `event_id` rejects duplicates; see
    /// [`is_unique_violation`].
    pub fn insert(conn: &Connection, stream: &str, record: &EventRecord) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO event_store_events
               (stream, event_type, event_id, metadata, data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                stream,
                record.event_type,
                record.event_id.as_str(),
                record.metadata,
                record.data,
                record.stored_timestamp(),
            ],
        )?;
        Ok(())
    }

    /// Number of rows currently assigned to `stream`.
    pub fn count_in_stream(conn: &Connection, stream: &str) -> Result<u64> {
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM event_store_events WHERE stream = ?1",
            params![stream],
            |row| row.get(0),
        )?;
        Ok(to_u64(n))
    }

    /// Total number of rows.
    pub fn count(conn: &Connection) -> Result<u64> {
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM event_store_events", [], |row| {
            row.get(0)
        })?;
        Ok(to_u64(n))
    }

    /// Global position of an event, if stored.
    pub fn row_id_of(conn: &Connection, event_id: &str) -> Result<Option<i64>> {
        let id = conn
            .query_row(
                "SELECT id FROM event_store_events WHERE event_id = ?1",
                params![event_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Whether an event is stored.
    pub fn exists(conn: &Connection, event_id: &str) -> Result<bool> {
        Ok(Self::row_id_of(conn, event_id)?.is_some())
    }

    /// Get a single event row by event id.
    pub fn get_by_event_id(conn: &Connection, event_id: &str) -> Result<Option<LegacyEventRow>> {
        let row = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE event_id = ?1"),
                params![event_id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Newest row of `stream`, or of the whole table when `stream` is `None`.
    pub fn last_in_stream(
        conn: &Connection,
        stream: Option<&str>,
    ) -> Result<Option<LegacyEventRow>> {
        let query = PageQuery {
            stream,
            direction: Direction::Backward,
            after_id: None,
            limit: Some(1),
        };
        Ok(Self::read_page(conn, &query)?.into_iter().next())
    }

    /// One page of rows, in `query.direction` order.
    pub fn read_page(conn: &Connection, query: &PageQuery<'_>) -> Result<Vec<LegacyEventRow>> {
        let (sql, params) = page_sql(query);
        let params_refs: Vec<&dyn ToSql> = params.iter().map(Box::as_ref).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_refs.as_slice(), Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Rows matching the query's stream filter and cursor (its limit is ignored).
    pub fn count_matching(conn: &Connection, query: &PageQuery<'_>) -> Result<u64> {
        let (filter, params) = filter_sql(query);
        let params_refs: Vec<&dyn ToSql> = params.iter().map(Box::as_ref).collect();
        let n: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM event_store_events{filter}"),
            params_refs.as_slice(),
            |row| row.get(0),
        )?;
        Ok(to_u64(n))
    }

    /// Move every row of `stream` into the catch-all. Returns rows moved.
    pub fn reassign_to_global(conn: &Connection, stream: &str) -> Result<usize> {
        let moved = conn.execute(
            "UPDATE event_store_events SET stream = ?1 WHERE stream = ?2",
            params![GLOBAL_STREAM_KEY, stream],
        )?;
        Ok(moved)
    }

    /// Streams holding the event, excluding the catch-all.
    pub fn streams_of(conn: &Connection, event_id: &str) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT stream FROM event_store_events
             WHERE event_id = ?1 AND stream <> ?2
             ORDER BY id ASC",
        )?;
        let streams = stmt
            .query_map(params![event_id, GLOBAL_STREAM_KEY], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(streams)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LegacyEventRow> {
        Ok(LegacyEventRow {
            id: row.get(0)?,
            stream: row.get(1)?,
            event_id: row.get(2)?,
            event_type: row.get(3)?,
            data: row.get(4)?,
            metadata: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

/// Whether `err` is a unique index violation (a duplicated `event_id`).
pub fn is_unique_violation(err: &EventStoreError) -> bool {
    matches!(
        err,
        EventStoreError::Sqlite(rusqlite::Error::SqliteFailure(failure, _))
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Build the page query. Always an explicit `ORDER BY id`, and a bound
/// `LIMIT` whenever the query carries one.
pub fn page_sql(query: &PageQuery<'_>) -> (String, Vec<Box<dyn ToSql>>) {
    let (filter, mut params) = filter_sql(query);
    let mut sql = format!(
        "{SELECT_COLUMNS}{filter} ORDER BY id {}",
        query.direction.sql_order()
    );
    if let Some(limit) = query.limit {
        params.push(Box::new(i64::try_from(limit).unwrap_or(i64::MAX)));
        let _ = write!(sql, " LIMIT ?{}", params.len());
    }
    (sql, params)
}

fn filter_sql(query: &PageQuery<'_>) -> (String, Vec<Box<dyn ToSql>>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(stream) = query.stream {
        params.push(Box::new(stream.to_string()));
        clauses.push(format!("stream = ?{}", params.len()));
    }
    if let Some(after_id) = query.after_id {
        params.push(Box::new(after_id));
        let op = query.direction.sql_after();
        clauses.push(format!("id {op} ?{}", params.len()));
    }

    if clauses.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), params)
    }
}

fn to_u64(n: i64) -> u64 {
    u64::try_from(n).unwrap_or_default()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
