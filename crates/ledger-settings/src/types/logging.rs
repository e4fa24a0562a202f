use ledger_core::logging::{LogFormat, init_subscriber};
use serde::{Deserialize, Serialize};

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Output format (`compact` or `json`).
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl LoggingSettings {
    /// Resolved output format; unknown names fall back to compact.
    pub fn log_format(&self) -> LogFormat {
        LogFormat::parse(&self.format).unwrap_or_default()
    }

    /// Install the global stderr subscriber at this level and format.
    ///
    /// `RUST_LOG` still takes precedence over `level`. No-op when a
    /// subscriber is already installed.
    pub fn init_subscriber(&self) {
        init_subscriber(&self.level, self.log_format());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_format_falls_back_to_compact() {
        let logging = LoggingSettings {
            format: "yaml".into(),
            ..Default::default()
        };
        assert_eq!(logging.log_format(), LogFormat::Compact);
    }

    #[test]
    fn json_format() {
        let logging = LoggingSettings {
            format: "json".into(),
            ..Default::default()
        };
        assert_eq!(logging.log_format(), LogFormat::Json);
    }

    #[test]
    fn init_subscriber_from_settings() {
        let logging = LoggingSettings {
            level: "debug".into(),
            format: "json".into(),
        };
        logging.init_subscriber();
        logging.init_subscriber();
        tracing::debug!("subscriber installed from settings");
    }
}
