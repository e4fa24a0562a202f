//! Database row types for mapping between `SQLite` rows and Rust structs.
//!
//! These represent the raw database row shape, not the public API types.
//! Conversion to [`EventRecord`] happens in [`LegacyEventRow::into_record`].

use ledger_core::EventId;

use crate::errors::Result;
use crate::types::EventRecord;

/// Raw row from the `event_store_events` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyEventRow {
    /// Global position (autoincrement primary key).
    pub id: i64,
    /// Owning stream; empty for the catch-all.
    pub stream: String,
    /// Caller-assigned event id.
    pub event_id: String,
    /// Type discriminator.
    pub event_type: String,
    /// Serialized payload.
    pub data: String,
    /// Serialized metadata, if any was stored.
    pub metadata: Option<String>,
    /// RFC 3339 creation time.
    pub created_at: String,
}

impl LegacyEventRow {
    /// Convert into the public record, parsing the timestamp.
    pub fn into_record(self) -> Result<EventRecord> {
        Ok(EventRecord {
            timestamp: EventRecord::parse_timestamp(&self.created_at)?,
            event_id: EventId::from_string(self.event_id),
            event_type: self.event_type,
            data: self.data,
            metadata: self.metadata.unwrap_or_default(),
        })
    }
}
