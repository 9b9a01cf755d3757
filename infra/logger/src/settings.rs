//! Serde-friendly logging settings, meant to be embedded in an application
//! config file as a `[log]` section.

use crate::error::LoggerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;

pub(crate) const DEFAULT_MAX_FILES: usize = 10;

/// Output format shared by the console and file layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// How often the log file is rolled over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(value: LogRotation) -> Self {
        match value {
            LogRotation::Minutely => Self::MINUTELY,
            LogRotation::Hourly => Self::HOURLY,
            LogRotation::Daily => Self::DAILY,
            LogRotation::Never => Self::NEVER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Minimum level: `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
    /// Optional directives, e.g. `modbus_rtu_slave=trace,mbrs_device=debug`.
    pub filter: Option<String>,
    pub console: bool,
    pub format: LogFormat,
    /// Rolling file output is enabled when a directory is set.
    pub directory: Option<PathBuf>,
    pub rotation: LogRotation,
    pub max_files: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            filter: None,
            console: true,
            format: LogFormat::Compact,
            directory: None,
            rotation: LogRotation::Daily,
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

impl LogSettings {
    /// Parses [`LogSettings::level`].
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown level name.
    pub fn level_filter(&self) -> Result<LevelFilter, LoggerError> {
        self.level
            .trim()
            .parse::<LevelFilter>()
            .map_err(|e| LoggerError::invalid(format!("Unknown log level '{}': {e}", self.level)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = LogSettings::default();
        assert_eq!(settings.level_filter().unwrap(), LevelFilter::INFO);
        assert!(settings.console);
        assert!(settings.directory.is_none());
        assert_eq!(settings.max_files, DEFAULT_MAX_FILES);
    }

    #[test]
    fn test_partial_deserialize() {
        let settings: LogSettings = serde_json::from_str(
            r#"{ "level": "debug", "format": "json", "directory": "logs", "rotation": "hourly" }"#,
        )
        .unwrap();

        assert_eq!(settings.level_filter().unwrap(), LevelFilter::DEBUG);
        assert_eq!(settings.format, LogFormat::Json);
        assert_eq!(settings.rotation, LogRotation::Hourly);
        assert_eq!(settings.directory.as_deref(), Some(std::path::Path::new("logs")));
        assert!(settings.console);
    }

    #[test]
    fn test_unknown_level_rejected() {
        let settings = LogSettings { level: "loud".to_owned(), ..LogSettings::default() };
        let err = settings.level_filter().unwrap_err();
        assert!(err.to_string().contains("Unknown log level 'loud'"));
    }
}
