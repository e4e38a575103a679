//! App configuration
//!
//! A small YAML file holding the serial parameters and retry policy. A
//! missing file is regenerated with the defaults; values outside the
//! known-good limits fall back to the defaults with a warning.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors from loading or writing the app configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("cannot access config file: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid YAML of the expected shape
    #[error("cannot parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// App configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Serial port device name
    pub serial_port: String,
    /// Serial baud rate
    pub baud: u32,
    /// Retry count for each protocol operation
    pub retries: u32,
    /// Serial read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Byte size of the random list for the self-test
    pub test_size: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            serial_port: default_port().to_string(),
            baud: 9600,
            retries: 3,
            read_timeout_ms: 2000,
            test_size: 64,
        }
    }
}

#[cfg(windows)]
fn default_port() -> &'static str {
    "COM1"
}

#[cfg(not(windows))]
fn default_port() -> &'static str {
    "/dev/ttyUSB0"
}

/// Inclusive limits for each numeric parameter. Parameters outside the
/// limits reset to the default.
const BAUD_LIMITS: (u32, u32) = (9600, 115200);
const RETRY_LIMITS: (u32, u32) = (1, 100);
const TIMEOUT_LIMITS: (u64, u64) = (10, 60_000);
const TEST_SIZE_LIMITS: (u16, u16) = (1, 1024);

impl AppConfig {
    /// Load the configuration from `path`. A missing file is generated
    /// with defaults; out-of-limit values are reset to defaults.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!(
                "Config file {} not found, generating one with default parameters",
                path.display()
            );
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        log::info!("Loading configuration file {}", path.display());
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&text)?;
        Ok(config.clamped())
    }

    /// Write the configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_yaml::to_string(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Replace any parameter outside its limits with the default.
    fn clamped(mut self) -> Self {
        let defaults = Self::default();

        fn check<T: PartialOrd + std::fmt::Display + Copy>(
            name: &str,
            value: &mut T,
            (min, max): (T, T),
            default: T,
        ) {
            if *value < min || *value > max {
                log::warn!(
                    "Config parameter {} = {} outside limits {}..={}, using default {}",
                    name,
                    value,
                    min,
                    max,
                    default
                );
                *value = default;
            }
        }

        check("baud", &mut self.baud, BAUD_LIMITS, defaults.baud);
        check("retries", &mut self.retries, RETRY_LIMITS, defaults.retries);
        check(
            "read_timeout_ms",
            &mut self.read_timeout_ms,
            TIMEOUT_LIMITS,
            defaults.read_timeout_ms,
        );
        check(
            "test_size",
            &mut self.test_size,
            TEST_SIZE_LIMITS,
            defaults.test_size,
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_within_limits() {
        let config = AppConfig::default();
        assert_eq!(config.clone().clamped(), config);
    }

    #[test]
    fn out_of_limit_values_reset_to_default() {
        let mut config = AppConfig::default();
        config.retries = 0;
        config.read_timeout_ms = 1_000_000;
        let clamped = config.clamped();
        assert_eq!(clamped.retries, AppConfig::default().retries);
        assert_eq!(clamped.read_timeout_ms, AppConfig::default().read_timeout_ms);
    }

    #[test]
    fn yaml_round_trip() {
        let config = AppConfig::default();
        let text = serde_yaml::to_string(&config).unwrap();
        let parsed: AppConfig = serde_yaml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn missing_keys_take_defaults() {
        let parsed: AppConfig = serde_yaml::from_str("baud: 115200\n").unwrap();
        assert_eq!(parsed.baud, 115200);
        assert_eq!(parsed.retries, AppConfig::default().retries);
    }
}
