//! Runtime configuration for the httpmeter plugin.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HttpmeterError, Result};

/// Bootstrap configuration assembled by the agent before any task starts.
///
/// Endpoint path, sampling period, and host identity are fixed for the
/// lifetime of the process; nothing re-reads configuration at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Unix socket path the plugin endpoint binds to.
    pub socket_path: PathBuf,
    /// Period between two sampling ticks.
    pub sample_period: Duration,
    /// Host name embedded in report node keys.
    pub hostname: String,
}

impl PluginConfig {
    /// Checks the configuration for values that cannot work at runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the sampling period is zero or the hostname
    /// is empty.
    pub fn validate(&self) -> Result<()> {
        if self.sample_period.is_zero() {
            return Err(HttpmeterError::Config {
                message: "sample period must be greater than zero".into(),
            });
        }
        if self.hostname.is_empty() {
            return Err(HttpmeterError::Config {
                message: "hostname must not be empty".into(),
            });
        }
        Ok(())
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(crate::constants::DEFAULT_SOCKET_PATH),
            sample_period: Duration::from_secs(crate::constants::DEFAULT_SAMPLE_PERIOD_SECS),
            hostname: String::from("localhost"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        PluginConfig::default().validate().expect("default is valid");
    }

    #[test]
    fn zero_period_is_rejected() {
        let config = PluginConfig {
            sample_period: Duration::ZERO,
            ..PluginConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_hostname_is_rejected() {
        let config = PluginConfig {
            hostname: String::new(),
            ..PluginConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
