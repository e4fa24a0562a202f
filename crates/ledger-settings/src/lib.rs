//! # ledger-settings
//!
//! Configuration for the ledger event store.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`LedgerSettings::default()`]
//! 2. **User file**: `~/.ledger/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `LEDGER_*` overrides (highest priority)
//!
//! The merged result is validated before it is returned, so a pool size or
//! read batch size of zero never reaches the repository.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
