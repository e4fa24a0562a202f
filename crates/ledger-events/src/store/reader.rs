//! Lazy, keyset-paginated record sequences.
//!
//! A read never holds a connection between pages: each page checks one out
//! of the pool, runs a single `LIMIT`ed query positioned after the last row
//! seen, and hands the connection back before the page is consumed.

use std::collections::VecDeque;

use crate::errors::Result;
use crate::specification::Direction;
use crate::sqlite::connection::ConnectionPool;
use crate::sqlite::repositories::event::{LegacyEventRepo, PageQuery};
use crate::sqlite::row_types::LegacyEventRow;
use crate::types::EventRecord;

/// Resolved start of a read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Position {
    /// First row in the read direction.
    Start,
    /// Rows after this row id in the read direction.
    After(i64),
    /// Nothing left to read.
    End,
}

/// Cursor state shared by [`Records`] and [`Batches`].
#[derive(Debug)]
pub(crate) struct Pager {
    pool: ConnectionPool,
    stream: Option<String>,
    direction: Direction,
    cursor: Option<i64>,
    remaining: Option<usize>,
    batch_size: usize,
    exhausted: bool,
}

impl Pager {
    pub(crate) fn new(
        pool: ConnectionPool,
        stream: Option<String>,
        direction: Direction,
        position: Position,
        limit: Option<usize>,
        batch_size: usize,
    ) -> Self {
        let cursor = match position {
            Position::After(id) => Some(id),
            Position::Start | Position::End => None,
        };
        Self {
            pool,
            stream,
            direction,
            cursor,
            remaining: limit,
            batch_size,
            exhausted: position == Position::End,
        }
    }

    fn is_done(&self) -> bool {
        self.exhausted || self.remaining == Some(0)
    }

    /// Fetch the next page. An empty page means the sequence is over.
    fn next_page(&mut self) -> Result<Vec<EventRecord>> {
        if self.is_done() {
            return Ok(Vec::new());
        }
        let page_size = self
            .remaining
            .map_or(self.batch_size, |left| left.min(self.batch_size));

        let rows = {
            let conn = self.pool.get()?;
            LegacyEventRepo::read_page(
                &conn,
                &PageQuery {
                    stream: self.stream.as_deref(),
                    direction: self.direction,
                    after_id: self.cursor,
                    limit: Some(page_size),
                },
            )?
        };

        if rows.len() < page_size {
            self.exhausted = true;
        }
        if let Some(last) = rows.last() {
            self.cursor = Some(last.id);
        }
        if let Some(left) = self.remaining.as_mut() {
            *left = left.saturating_sub(rows.len());
        }

        rows.into_iter().map(LegacyEventRow::into_record).collect()
    }

    fn fail(&mut self) {
        self.exhausted = true;
    }
}

/// Lazy sequence of records produced by
/// [`LegacyEventRepository::read`](crate::LegacyEventRepository::read).
///
/// Finite and forward-only. The first error ends the sequence.
#[derive(Debug)]
pub struct Records {
    pager: Pager,
    buffer: VecDeque<EventRecord>,
}

impl Records {
    pub(crate) fn new(pager: Pager) -> Self {
        Self {
            pager,
            buffer: VecDeque::new(),
        }
    }
}

impl Iterator for Records {
    type Item = Result<EventRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(record) = self.buffer.pop_front() {
            return Some(Ok(record));
        }
        match self.pager.next_page() {
            Ok(page) => {
                self.buffer.extend(page);
                self.buffer.pop_front().map(Ok)
            }
            Err(e) => {
                self.pager.fail();
                Some(Err(e))
            }
        }
    }
}

/// Lazy sequence of pages produced by
/// [`LegacyEventRepository::read_batches`](crate::LegacyEventRepository::read_batches).
///
/// Every page except possibly the last holds exactly the batch size.
#[derive(Debug)]
pub struct Batches {
    pager: Pager,
}

impl Batches {
    pub(crate) fn new(pager: Pager) -> Self {
        Self { pager }
    }
}

impl Iterator for Batches {
    type Item = Result<Vec<EventRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.pager.next_page() {
            Ok(page) if page.is_empty() => None,
            Ok(page) => Some(Ok(page)),
            Err(e) => {
                self.pager.fail();
                Some(Err(e))
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::sqlite::connection::{ConnectionConfig, new_in_memory};
    use crate::sqlite::migrations::run_migrations;
    use ledger_core::EventId;

    fn pool_with(stream: &str, n: usize) -> ConnectionPool {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
        for i in 0..n {
            let record = EventRecord::new(EventId::from(format!("e{i}")), "T", "{}", "{}");
            LegacyEventRepo::insert(&conn, stream, &record).unwrap();
        }
        pool
    }

    fn pager(pool: &ConnectionPool, limit: Option<usize>, batch: usize) -> Pager {
        Pager::new(
            pool.clone(),
            None,
            Direction::Forward,
            Position::Start,
            limit,
            batch,
        )
    }

    #[test]
    fn records_span_pages() {
        let pool = pool_with("s", 7);
        let ids: Vec<String> = Records::new(pager(&pool, None, 3))
            .map(|r| r.unwrap().event_id.into_inner())
            .collect();
        assert_eq!(ids, vec!["e0", "e1", "e2", "e3", "e4", "e5", "e6"]);
    }

    #[test]
    fn limit_shrinks_the_last_page() {
        let pool = pool_with("s", 10);
        let sizes: Vec<usize> = Batches::new(pager(&pool, Some(5), 2))
            .map(|b| b.unwrap().len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn exact_multiple_of_batch_ends_cleanly() {
        let pool = pool_with("s", 4);
        let sizes: Vec<usize> = Batches::new(pager(&pool, None, 2))
            .map(|b| b.unwrap().len())
            .collect();
        assert_eq!(sizes, vec![2, 2]);
    }

    #[test]
    fn empty_table_yields_nothing() {
        let pool = pool_with("s", 0);
        assert_eq!(Records::new(pager(&pool, None, 10)).count(), 0);
        assert_eq!(Batches::new(pager(&pool, None, 10)).count(), 0);
    }

    #[test]
    fn end_position_yields_nothing_without_a_query() {
        let pool = pool_with("s", 3);
        let pager = Pager::new(
            pool.clone(),
            None,
            Direction::Forward,
            Position::End,
            None,
            2,
        );
        let records = Records::new(pager);
        assert!(format!("{records:?}").starts_with("Records"));
        assert_eq!(records.count(), 0);
    }

    #[test]
    fn after_position_skips_the_start_row() {
        let pool = pool_with("s", 3);
        let first_id = LegacyEventRepo::row_id_of(&pool.get().unwrap(), "e0")
            .unwrap()
            .unwrap();
        let pager = Pager::new(
            pool.clone(),
            None,
            Direction::Forward,
            Position::After(first_id),
            None,
            10,
        );
        let ids: Vec<String> = Records::new(pager)
            .map(|r| r.unwrap().event_id.into_inner())
            .collect();
        assert_eq!(ids, vec!["e1", "e2"]);
    }

    #[test]
    fn connection_is_released_between_pages() {
        let pool = pool_with("s", 4);
        let mut records = Records::new(pager(&pool, None, 2));
        records.next().unwrap().unwrap();
        // Only the pool's own idle connections remain; none is held by the reader.
        assert_eq!(pool.state().connections, pool.state().idle_connections);
    }

    #[test]
    fn backward_with_stream_filter() {
        let pool = pool_with("s", 3);
        let pager = Pager::new(
            pool.clone(),
            Some("s".to_string()),
            Direction::Backward,
            Position::Start,
            None,
            2,
        );
        let ids: Vec<String> = Records::new(pager)
            .map(|r| r.unwrap().event_id.into_inner())
            .collect();
        assert_eq!(ids, vec!["e2", "e1", "e0"]);
    }
}
