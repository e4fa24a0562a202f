use std::fmt;

/// Optimistic concurrency precondition for an append.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpectedVersion {
    /// No check; concurrent appends interleave.
    Any,
    /// The stream must be empty.
    None,
    /// Infer the version from storage. Not supported by the legacy
    /// repository; every append with this mode is rejected.
    Auto,
    /// Zero-based version of the stream's last event, so the stream must
    /// hold exactly `n + 1` events.
    Exact(u64),
}

impl ExpectedVersion {
    /// Number of events the stream must contain, or `None` when unchecked.
    pub(crate) fn required_len(self) -> Option<u64> {
        match self {
            Self::Any | Self::Auto => None,
            Self::None => Some(0),
            Self::Exact(version) => Some(version.saturating_add(1)),
        }
    }

    /// Describe a stream length the way versions are written (`none`, `0`, `1`, ...).
    pub(crate) fn describe_len(len: u64) -> String {
        match len.checked_sub(1) {
            Some(version) => version.to_string(),
            None => "none".to_string(),
        }
    }
}

impl fmt::Display for ExpectedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::None => f.write_str("none"),
            Self::Auto => f.write_str("auto"),
            Self::Exact(version) => write!(f, "{version}"),
        }
    }
}
