//! Core value types shared by the repository, the reader and the mappers.

mod expected_version;
mod record;
mod stream;

pub use expected_version::ExpectedVersion;
pub use record::EventRecord;
pub use stream::{Stream, StreamName};

pub(crate) use stream::GLOBAL_STREAM_KEY;
