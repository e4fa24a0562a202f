//! High-level repository API.
//!
//! - **[`legacy_repository`]**: [`LegacyEventRepository`], appends, reads,
//!   stream deletion and membership.
//! - **[`reader`]**: lazy [`Records`] and [`Batches`] sequences.
//! - **[`specification_reader`]**: [`SpecificationReader`], reads and appends
//!   through a mapper.

pub mod legacy_repository;
pub mod reader;
pub mod specification_reader;

pub use legacy_repository::{DEFAULT_BATCH_SIZE, LegacyEventRepository};
pub use reader::{Batches, Records};
pub use specification_reader::SpecificationReader;
