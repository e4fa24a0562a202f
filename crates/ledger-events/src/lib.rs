//! # ledger-events
//!
//! Legacy single-table event repository with a `SQLite` backend.
//!
//! One `event_store_events` table serves two views at once: the global log
//! (every event ever written, ordered by row id) and per-stream
//! sub-sequences (rows filtered by their `stream` column). Each event lives
//! in exactly one named stream or in the implicit catch-all.
//!
//! - **Types**: [`Stream`], [`StreamName`], [`ExpectedVersion`], [`EventRecord`]
//! - **Reads**: [`ReadSpecification`] built by the caller, executed lazily by
//!   the repository as keyset-paginated queries
//! - **Repository**: [`LegacyEventRepository`] for append, read, stream
//!   deletion and membership lookup, with optimistic concurrency enforced by
//!   `BEGIN IMMEDIATE` transactions
//! - **Mapping**: [`Mapper`] converts domain events to and from records;
//!   [`SpecificationReader`] pairs a repository with a mapper
//! - **`SQLite` backend**: `r2d2` pool, embedded migrations, stateless
//!   repository structs

#![deny(unsafe_code)]

pub mod errors;
pub mod mapper;
pub mod specification;
pub mod sqlite;
pub mod store;
pub mod types;

pub use errors::{EventStoreError, Result};
pub use mapper::{DomainEvent, EventPayload, JsonMapper, Mapper, NullMapper};
pub use specification::{Direction, ReadSpecification, ReadStart};
pub use store::{Batches, LegacyEventRepository, Records, SpecificationReader};
pub use types::{EventRecord, ExpectedVersion, Stream, StreamName};

pub use ledger_core::EventId;
