//! # ledger-core
//!
//! Foundation types shared by the ledger crates.
//!
//! - **IDs**: [`EventId`], a branded newtype over a UUID v7 string
//! - **Logging**: [`logging::init_subscriber`] for the global `tracing` subscriber

#![deny(unsafe_code)]

pub mod ids;
pub mod logging;

pub use ids::EventId;
