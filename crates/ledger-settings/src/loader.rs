//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`LedgerSettings::default()`]
//! 2. If `~/.ledger/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `LEDGER_*` environment variable overrides (highest priority)
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::LedgerSettings;

/// Log levels accepted by `LEDGER_LOG_LEVEL`.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Resolve the path to the settings file (`~/.ledger/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".ledger").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<LedgerSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON or an unusable value, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<LedgerSettings> {
    let defaults = serde_json::to_value(LedgerSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: LedgerSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are logged and ignored (fall back to file/default).
pub fn apply_env_overrides(settings: &mut LedgerSettings) {
    // ── Database ────────────────────────────────────────────────────
    if let Some(v) = read_env_string("LEDGER_DB_PATH") {
        settings.database.path = v;
    }
    if let Some(v) = read_env_u32("LEDGER_POOL_SIZE", 1, 256) {
        settings.database.pool_size = v;
    }
    if let Some(v) = read_env_u32("LEDGER_BUSY_TIMEOUT_MS", 0, 600_000) {
        settings.database.busy_timeout_ms = v;
    }

    // ── Reader ──────────────────────────────────────────────────────
    if let Some(v) = read_env_usize("LEDGER_READ_BATCH_SIZE", 1, 100_000) {
        settings.reader.batch_size = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read_env_string("LEDGER_LOG_LEVEL") {
        if let Some(level) = parse_log_level(&v) {
            settings.logging.level = level;
        } else {
            warn!(key = "LEDGER_LOG_LEVEL", value = %v, "invalid log level, ignoring");
        }
    }
    if let Some(v) = read_env_string("LEDGER_LOG_FORMAT") {
        settings.logging.format = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Normalize a log level name, rejecting unknown levels.
pub fn parse_log_level(val: &str) -> Option<String> {
    let level = val.trim().to_ascii_lowercase();
    LOG_LEVELS.contains(&level.as_str()).then_some(level)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u32(name: &str, min: u32, max: u32) -> Option<u32> {
    let val = std::env::var(name).ok()?;
    let result = parse_u32_range(&val, min, max);
    if result.is_none() {
        warn!(key = name, value = %val, "invalid u32 env var, ignoring");
    }
    result
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    let val = std::env::var(name).ok()?;
    let result = parse_usize_range(&val, min, max);
    if result.is_none() {
        warn!(key = name, value = %val, "invalid usize env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SettingsError;
    use assert_matches::assert_matches;

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({
            "database": {"poolSize": 5, "busyTimeoutMs": 30000}
        });
        let source = serde_json::json!({
            "database": {"poolSize": 8}
        });
        let merged = deep_merge(target, source);
        assert_eq!(merged["database"]["poolSize"], 8);
        assert_eq!(merged["database"]["busyTimeoutMs"], 30000);
    }

    #[test]
    fn merge_skips_null() {
        let target = serde_json::json!({"level": "warn"});
        let source = serde_json::json!({"level": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["level"], "warn");
    }

    #[test]
    fn merge_replaces_arrays_and_primitives() {
        let target = serde_json::json!({"a": [1, 2, 3], "b": {"c": 1}});
        let source = serde_json::json!({"a": [9], "b": 7});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], serde_json::json!([9]));
        assert_eq!(merged["b"], 7);
    }

    #[test]
    fn merge_adds_new_keys() {
        let merged = deep_merge(serde_json::json!({"a": 1}), serde_json::json!({"b": 2}));
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    // ── load_settings_from_path ─────────────────────────────────────

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from_path(&dir.path().join("absent.json"))
            .unwrap();
        assert_eq!(settings.reader, LedgerSettings::default().reader);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"database": {"path": "/srv/ledger/events.db", "cacheSizeKib": 4096}}"#,
        )
        .unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.database.cache_size_kib, 4096);
        assert_eq!(settings.database.busy_timeout_ms, 30_000);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_matches!(load_settings_from_path(&path), Err(SettingsError::Json(_)));
    }

    #[test]
    fn zero_batch_size_in_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"reader": {"batchSize": 0}}"#)
            .unwrap();
        assert_matches!(
            load_settings_from_path(&path),
            Err(SettingsError::InvalidValue(_))
        );
    }

    #[test]
    fn settings_path_is_under_dot_ledger() {
        let path = settings_path();
        assert!(path.ends_with(".ledger/settings.json"));
    }

    // ── parsing ─────────────────────────────────────────────────────

    #[test]
    fn parse_u32_in_range() {
        assert_eq!(parse_u32_range("5", 1, 256), Some(5));
        assert_eq!(parse_u32_range(" 12 ", 1, 256), Some(12));
        assert_eq!(parse_u32_range("0", 1, 256), None);
        assert_eq!(parse_u32_range("257", 1, 256), None);
        assert_eq!(parse_u32_range("five", 1, 256), None);
    }

    #[test]
    fn parse_usize_in_range() {
        assert_eq!(parse_usize_range("100", 1, 100_000), Some(100));
        assert_eq!(parse_usize_range("-1", 1, 100_000), None);
    }

    #[test]
    fn parse_log_levels() {
        assert_eq!(parse_log_level("INFO"), Some("info".to_string()));
        assert_eq!(parse_log_level("debug"), Some("debug".to_string()));
        assert_eq!(parse_log_level("verbose"), None);
    }
}
