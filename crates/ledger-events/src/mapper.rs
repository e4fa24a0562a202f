//! Conversion between domain events and stored records.
//!
//! The repository only understands [`EventRecord`]s. A [`Mapper`] sits in
//! front of it: [`NullMapper`] passes records through untouched and
//! [`JsonMapper`] serializes a typed payload to JSON exactly once.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use ledger_core::EventId;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::Result;
use crate::types::EventRecord;

/// Two-way conversion between a domain event type and [`EventRecord`].
pub trait Mapper {
    /// Domain-side event type.
    type Event;

    /// Serialize a domain event for storage.
    fn event_to_record(&self, event: &Self::Event) -> Result<EventRecord>;

    /// Rebuild a domain event from storage.
    fn record_to_event(&self, record: EventRecord) -> Result<Self::Event>;
}

/// Identity mapper; domain events are records.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullMapper;

impl Mapper for NullMapper {
    type Event = EventRecord;

    fn event_to_record(&self, event: &EventRecord) -> Result<EventRecord> {
        Ok(event.clone())
    }

    fn record_to_event(&self, record: EventRecord) -> Result<EventRecord> {
        Ok(record)
    }
}

/// Payload of a [`DomainEvent`] handled by [`JsonMapper`].
pub trait EventPayload: Serialize + DeserializeOwned {
    /// Value stored in the `event_type` column.
    fn event_type(&self) -> &str;
}

/// A typed event with JSON metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct DomainEvent<T> {
    /// Globally unique id.
    pub event_id: EventId,
    /// Typed payload.
    pub data: T,
    /// Free-form metadata.
    pub metadata: Map<String, Value>,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

impl<T> DomainEvent<T> {
    /// New event with a fresh id, no metadata and the current time.
    pub fn new(data: T) -> Self {
        Self {
            event_id: EventId::new(),
            data,
            metadata: Map::new(),
            timestamp: Utc::now(),
        }
    }

    /// Add one metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        let _ = self.metadata.insert(key.into(), value);
        self
    }
}

/// Maps [`DomainEvent<T>`] to records with JSON `data` and `metadata`.
pub struct JsonMapper<T> {
    _payload: PhantomData<fn() -> T>,
}

impl<T> JsonMapper<T> {
    /// Create a mapper for payload type `T`.
    pub fn new() -> Self {
        Self {
            _payload: PhantomData,
        }
    }
}

impl<T> Default for JsonMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonMapper<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: EventPayload> Mapper for JsonMapper<T> {
    type Event = DomainEvent<T>;

    fn event_to_record(&self, event: &DomainEvent<T>) -> Result<EventRecord> {
        Ok(EventRecord {
            event_id: event.event_id.clone(),
            event_type: event.data.event_type().to_string(),
            data: serde_json::to_string(&event.data)?,
            metadata: serde_json::to_string(&event.metadata)?,
            timestamp: event.timestamp,
        })
    }

    fn record_to_event(&self, record: EventRecord) -> Result<DomainEvent<T>> {
        let metadata = if record.metadata.is_empty() {
            Map::new()
        } else {
            serde_json::from_str(&record.metadata)?
        };
        Ok(DomainEvent {
            event_id: record.event_id,
            data: serde_json::from_str(&record.data)?,
            metadata,
            timestamp: record.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EventStoreError;
    use assert_matches::assert_matches;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    enum OrderEvent {
        Placed { total: u32 },
        Cancelled,
    }

    impl EventPayload for OrderEvent {
        fn event_type(&self) -> &str {
            match self {
                Self::Placed { .. } => "OrderPlaced",
                Self::Cancelled => "OrderCancelled",
            }
        }
    }

    #[test]
    fn null_mapper_is_identity() {
        let record = EventRecord::new(EventId::from("e1"), "T", "---\n", "");
        let stored = NullMapper.event_to_record(&record).unwrap();
        assert_eq!(NullMapper.record_to_event(stored).unwrap(), record);
    }

    #[test]
    fn json_mapper_round_trip() {
        let mapper = JsonMapper::<OrderEvent>::new();
        let event = DomainEvent::new(OrderEvent::Placed { total: 42 })
            .with_metadata("correlation_id", json!("c-1"));

        let record = mapper.event_to_record(&event).unwrap();
        assert_eq!(record.event_type, "OrderPlaced");
        assert_eq!(record.data, r#"{"Placed":{"total":42}}"#);
        assert_eq!(record.metadata, r#"{"correlation_id":"c-1"}"#);

        assert_eq!(mapper.record_to_event(record).unwrap(), event);
    }

    #[test]
    fn empty_metadata_reads_as_empty_map() {
        let mapper = JsonMapper::<OrderEvent>::new();
        let record = EventRecord::new(EventId::from("e1"), "OrderCancelled", "\"Cancelled\"", "");
        let event = mapper.record_to_event(record).unwrap();
        assert_eq!(event.data, OrderEvent::Cancelled);
        assert!(event.metadata.is_empty());
    }

    #[test]
    fn undecodable_data_is_a_serde_error() {
        let mapper = JsonMapper::<OrderEvent>::new();
        let record = EventRecord::new(EventId::from("e1"), "OrderPlaced", "---\n:total: 1\n", "");
        assert_matches!(
            mapper.record_to_event(record),
            Err(EventStoreError::Serde(_))
        );
    }
}
