//! Configuration types.

use serde::{Deserialize, Serialize};
use stratum_telemetry::{LogConfig, MetricsConfig, TelemetryConfig};

use crate::ConfigError;

/// Default deadline margin, in milliseconds.
pub const DEFAULT_TIMEOUT_EARLY_IN_MILLIS: i64 = 5;

/// Complete Stratum function configuration.
///
/// # Example
///
/// ```
/// use stratum_config::StratumConfig;
///
/// let config = StratumConfig::default();
/// assert_eq!(config.engine.timeout_early_in_millis, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct StratumConfig {
    /// Engine settings.
    #[serde(default)]
    pub engine: EngineSettings,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsSettings,
}

impl StratumConfig {
    /// Development preset: pretty debug logs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LoggingSettings {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                ansi_enabled: true,
                ..LoggingSettings::default()
            },
            ..Self::default()
        }
    }

    /// Production preset: JSON info logs.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the log level is not a valid
    /// filter directive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.enabled {
            stratum_telemetry::logging::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }
        Ok(())
    }

    /// Telemetry settings for [`stratum_telemetry::init_telemetry`].
    #[must_use]
    pub fn to_telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            logging: self.logging.to_log_config(),
            metrics: MetricsConfig {
                enabled: self.metrics.enabled,
                ..MetricsConfig::default()
            },
        }
    }
}

/// Engine settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Milliseconds before the platform deadline at which the handler is
    /// abandoned. Zero or negative disables the deadline guard.
    pub timeout_early_in_millis: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            timeout_early_in_millis: DEFAULT_TIMEOUT_EARLY_IN_MILLIS,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Whether logging is enabled.
    pub enabled: bool,
    /// Filter directive.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Whether to colorize pretty output.
    pub ansi_enabled: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            ansi_enabled: false,
        }
    }
}

impl LoggingSettings {
    /// Converts to the telemetry crate's logging configuration.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        let base = match self.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            ansi: self.ansi_enabled,
            ..base
        }
    }
}

/// Metrics settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsSettings {
    /// Whether the Prometheus recorder is installed.
    pub enabled: bool,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StratumConfig::default();
        assert_eq!(config.engine.timeout_early_in_millis, 5);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.metrics.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_development_preset() {
        let config = StratumConfig::development();
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.logging.level, "debug");

        let log = config.logging.to_log_config();
        assert!(!log.json_format);
        assert!(log.ansi);
    }

    #[test]
    fn test_invalid_level_fails_validation() {
        let mut config = StratumConfig::default();
        config.logging.level = "info=notalevel".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.level"));

        config.logging.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<StratumConfig, _> = toml::from_str("[engine]\ntimeout_early = 5\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config: StratumConfig = toml::from_str("[logging]\nlevel = \"warn\"\n").unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.engine.timeout_early_in_millis, 5);
    }

    #[test]
    fn test_telemetry_config() {
        let mut config = StratumConfig::default();
        config.metrics.enabled = false;

        let telemetry = config.to_telemetry_config();
        assert!(!telemetry.metrics.enabled);
        assert!(telemetry.logging.json_format);
    }
}
