//! Stream identity.
//!
//! The catch-all pseudo-stream is a variant of [`Stream`], never a string.
//! Its storage key is the empty string, which [`StreamName::new`] rejects,
//! so a caller stream named `"all"` (or anything else) cannot collide with it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{EventStoreError, Result};

/// Value written to the `stream` column for rows in the catch-all.
pub(crate) const GLOBAL_STREAM_KEY: &str = "";

/// Validated name of a caller-defined stream.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StreamName(String);

impl StreamName {
    /// Validate and wrap a stream name. Empty names are rejected.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(EventStoreError::IncorrectStreamData(
                "stream name must not be empty".into(),
            ));
        }
        Ok(Self(name))
    }

    /// Return the name as a slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for StreamName {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StreamName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Target of an append or filter of a read.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Stream {
    /// The global log. As a read filter it means "no filter"; as an append
    /// target it is the catch-all.
    #[default]
    Global,
    /// A caller-defined stream.
    Named(StreamName),
}

impl Stream {
    /// Shorthand for `Stream::Named(StreamName::new(name)?)`.
    pub fn named(name: impl Into<String>) -> Result<Self> {
        Ok(Self::Named(StreamName::new(name)?))
    }

    /// Whether this is the catch-all.
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }

    /// Value stored in (or compared against) the `stream` column.
    pub(crate) fn storage_key(&self) -> &str {
        match self {
            Self::Global => GLOBAL_STREAM_KEY,
            Self::Named(name) => name.as_str(),
        }
    }
}

impl From<StreamName> for Stream {
    fn from(name: StreamName) -> Self {
        Self::Named(name)
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("<global>"),
            Self::Named(name) => f.write_str(name.as_str()),
        }
    }
}
