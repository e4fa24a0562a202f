use chrono::{DateTime, SecondsFormat, Utc};
use ledger_core::EventId;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// An event as the repository stores it.
///
/// `data` and `metadata` are opaque text; the repository never re-encodes
/// them. `timestamp` is informational and plays no part in ordering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Caller-assigned, globally unique id.
    pub event_id: EventId,
    /// Type discriminator.
    pub event_type: String,
    /// Serialized payload.
    pub data: String,
    /// Serialized metadata.
    pub metadata: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

impl EventRecord {
    /// Build a record stamped with the current time.
    pub fn new(
        event_id: EventId,
        event_type: impl Into<String>,
        data: impl Into<String>,
        metadata: impl Into<String>,
    ) -> Self {
        Self {
            event_id,
            event_type: event_type.into(),
            data: data.into(),
            metadata: metadata.into(),
            timestamp: Utc::now(),
        }
    }

    /// Replace the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Timestamp in the lossless storage form (RFC 3339, nanoseconds, `Z`).
    pub(crate) fn stored_timestamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    /// Parse a timestamp written by [`EventRecord::stored_timestamp`].
    pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
    }
}
