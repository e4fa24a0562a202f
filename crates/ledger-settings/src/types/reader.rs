use serde::{Deserialize, Serialize};

/// Read pagination settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReaderSettings {
    /// Rows fetched per query when a read specification does not set its own.
    pub batch_size: usize,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self { batch_size: 100 }
    }
}
