// Configuration management with layered configuration (defaults, file, env)

use crate::errors::ValidationError;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub device: DeviceConfig,
    pub cloud: CloudConfig,
    pub sensor: SensorConfig,
    pub scheduler: SchedulerSettings,
    pub transport: TransportConfig,
    pub observability: ObservabilityConfig,
}

/// Identity printed in the welcome banner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub name: String,
    pub fw_version: String,
    pub arch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    pub endpoint_url: String,
    pub command: String,
    pub metric_name: String,
    pub request_timeout_seconds: u64,
}

/// Range of the simulated reading: `[min_value, min_value + span)`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub min_value: f64,
    pub span: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub interval_ms: u64,
    /// Unset means a publish may wait for its response forever
    pub response_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub check_interval_ms: u64,
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub metrics_port: Option<u16>,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Local overrides (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.device.name.is_empty() {
            return Err(ValidationError::MissingField("device.name".to_string()));
        }

        if self.cloud.endpoint_url.is_empty() {
            return Err(ValidationError::invalid(
                "cloud.endpoint_url",
                "cannot be empty",
            ));
        }
        if reqwest::Url::parse(&self.cloud.endpoint_url).is_err() {
            return Err(ValidationError::invalid(
                "cloud.endpoint_url",
                format!("'{}' is not an absolute URL", self.cloud.endpoint_url),
            ));
        }
        if self.cloud.command.is_empty() {
            return Err(ValidationError::MissingField("cloud.command".to_string()));
        }
        if self.cloud.metric_name.is_empty() {
            return Err(ValidationError::MissingField(
                "cloud.metric_name".to_string(),
            ));
        }
        if self.cloud.request_timeout_seconds == 0 {
            return Err(ValidationError::invalid(
                "cloud.request_timeout_seconds",
                "must be greater than 0",
            ));
        }

        if !self.sensor.min_value.is_finite() {
            return Err(ValidationError::invalid(
                "sensor.min_value",
                "must be a finite number",
            ));
        }
        if !(self.sensor.span.is_finite() && self.sensor.span > 0.0) {
            return Err(ValidationError::invalid(
                "sensor.span",
                "must be greater than 0",
            ));
        }
        let max_value = self.sensor.min_value + self.sensor.span;
        if !(max_value.is_finite() && max_value > self.sensor.min_value) {
            return Err(ValidationError::invalid(
                "sensor.span",
                format!(
                    "too small to widen the range above min_value {}",
                    self.sensor.min_value
                ),
            ));
        }

        if self.scheduler.interval_ms == 0 {
            return Err(ValidationError::invalid(
                "scheduler.interval_ms",
                "must be greater than 0",
            ));
        }
        if self.scheduler.response_timeout_ms == Some(0) {
            return Err(ValidationError::invalid(
                "scheduler.response_timeout_ms",
                "must be greater than 0 when set",
            ));
        }

        if self.transport.check_interval_ms == 0 {
            return Err(ValidationError::invalid(
                "transport.check_interval_ms",
                "must be greater than 0",
            ));
        }
        if self.transport.connect_timeout_ms == 0 {
            return Err(ValidationError::invalid(
                "transport.connect_timeout_ms",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            cloud: CloudConfig::default(),
            sensor: SensorConfig::default(),
            scheduler: SchedulerSettings::default(),
            transport: TransportConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: "Sensor Agent".to_string(),
            fw_version: env!("CARGO_PKG_VERSION").to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            endpoint_url: "https://api.cesanta.com".to_string(),
            command: "/v1/Metrics.Publish".to_string(),
            metric_name: "value".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            min_value: 20.0,
            span: 20.0,
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            response_timeout_ms: None,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: 1000,
            connect_timeout_ms: 3000,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_port: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_default_publish_target() {
        let settings = Settings::default();
        assert_eq!(settings.cloud.command, "/v1/Metrics.Publish");
        assert_eq!(settings.cloud.metric_name, "value");
        assert_eq!(settings.scheduler.interval_ms, 2000);
        assert_eq!(settings.sensor.min_value, 20.0);
        assert_eq!(settings.sensor.span, 20.0);
        assert!(settings.scheduler.response_timeout_ms.is_none());
    }

    #[test]
    fn test_validation_catches_empty_endpoint() {
        let mut settings = Settings::default();
        settings.cloud.endpoint_url = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_relative_endpoint() {
        let mut settings = Settings::default();
        settings.cloud.endpoint_url = "//api.example.com".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_zero_interval() {
        let mut settings = Settings::default();
        settings.scheduler.interval_ms = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_non_positive_span() {
        let mut settings = Settings::default();
        settings.sensor.span = 0.0;
        assert!(settings.validate().is_err());

        settings.sensor.span = f64::NAN;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_span_lost_to_rounding() {
        let mut settings = Settings::default();
        settings.sensor.min_value = 1e20;
        settings.sensor.span = 1.0;
        assert!(settings.validate().is_err());

        settings.sensor.span = 1e6;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_catches_overflowing_range() {
        let mut settings = Settings::default();
        settings.sensor.min_value = f64::MAX;
        settings.sensor.span = f64::MAX;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_zero_response_timeout() {
        let mut settings = Settings::default();
        settings.scheduler.response_timeout_ms = Some(0);
        assert!(settings.validate().is_err());

        settings.scheduler.response_timeout_ms = Some(5000);
        assert!(settings.validate().is_ok());
    }
}
