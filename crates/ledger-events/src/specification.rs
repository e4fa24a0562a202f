//! Read specifications.
//!
//! A [`ReadSpecification`] describes which rows a read returns: an optional
//! stream filter, a direction, a start boundary, an optional total
//! limit and the page size used to fetch rows. It is plain data; the
//! repository validates it when the read starts.

use ledger_core::EventId;

use crate::types::Stream;

/// Order in which rows are returned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    /// Ascending global id.
    #[default]
    Forward,
    /// Descending global id.
    Backward,
}

impl Direction {
    /// `ASC` or `DESC`.
    pub(crate) fn sql_order(self) -> &'static str {
        match self {
            Self::Forward => "ASC",
            Self::Backward => "DESC",
        }
    }

    /// Comparison that moves a keyset cursor in this direction.
    pub(crate) fn sql_after(self) -> &'static str {
        match self {
            Self::Forward => ">",
            Self::Backward => "<",
        }
    }
}

/// Where a read begins.
///
/// `Head` and `Tail` are the oldest and newest ends of the log. A read moves
/// away from its start in the chosen direction, so a forward read from the
/// tail yields nothing and a backward read from the tail is the same as a
/// backward read from the head: newest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ReadStart {
    /// First row in the chosen direction.
    #[default]
    Head,
    /// Past the newest row.
    Tail,
    /// Rows strictly after this event in the chosen direction.
    After(EventId),
}

/// Description of a read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadSpecification {
    /// `Stream::Global` reads every row; a named stream filters by name.
    pub stream: Stream,
    /// Row order.
    pub direction: Direction,
    /// Exclusive start boundary.
    pub start: ReadStart,
    /// Maximum number of rows in total.
    pub limit: Option<usize>,
    /// Rows per query; the repository default applies when unset.
    pub batch_size: Option<usize>,
}

impl ReadSpecification {
    /// Forward read of the global log from the head, unlimited.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the read to one stream (or lift the filter with `Stream::Global`).
    #[must_use]
    pub fn stream(mut self, stream: impl Into<Stream>) -> Self {
        self.stream = stream.into();
        self
    }

    /// Read in ascending id order.
    #[must_use]
    pub fn forward(mut self) -> Self {
        self.direction = Direction::Forward;
        self
    }

    /// Read in descending id order.
    #[must_use]
    pub fn backward(mut self) -> Self {
        self.direction = Direction::Backward;
        self
    }

    /// Start at the first row in the chosen direction.
    #[must_use]
    pub fn from_head(mut self) -> Self {
        self.start = ReadStart::Head;
        self
    }

    /// Start past the newest row.
    #[must_use]
    pub fn from_tail(mut self) -> Self {
        self.start = ReadStart::Tail;
        self
    }

    /// Start after the given event (exclusive).
    #[must_use]
    pub fn after(mut self, event_id: impl Into<EventId>) -> Self {
        self.start = ReadStart::After(event_id.into());
        self
    }

    /// Return at most `limit` rows.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Fetch `batch_size` rows per query.
    #[must_use]
    pub fn in_batches(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}
