//! Repository implementations for `SQLite` database operations.
//!
//! Each repository is a stateless struct whose methods take a `&Connection`
//! parameter, so every operation is a function of (connection, input) and
//! can run inside whatever transaction the caller opened.

pub mod event;
