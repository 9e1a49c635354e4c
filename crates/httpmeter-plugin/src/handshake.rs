//! Plugin capability handshake.
//!
//! The consumer probes `GET /` once per discovered socket to learn what
//! the plugin is and which interfaces it speaks. The body is static:
//! it never depends on sampler or store state.

use httpmeter_common::constants;
use serde::{Deserialize, Serialize};

/// Capability descriptor returned on `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSpec {
    /// Plugin name, unique per consumer.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Interfaces the plugin implements; must contain `reporter` for
    /// the consumer to poll `/report`.
    pub interfaces: Vec<String>,
    /// Plugin protocol API version.
    pub api_version: String,
}

impl Default for PluginSpec {
    fn default() -> Self {
        Self {
            name: constants::PLUGIN_NAME.into(),
            description: constants::PLUGIN_DESCRIPTION.into(),
            interfaces: constants::PLUGIN_INTERFACES
                .iter()
                .map(|&interface| interface.into())
                .collect(),
            api_version: constants::PLUGIN_API_VERSION.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_declares_the_reporter_interface() {
        let spec = PluginSpec::default();
        assert!(spec.interfaces.iter().any(|i| i == "reporter"));
        assert_eq!(spec.api_version, "1");
    }

    #[test]
    fn handshake_serializes_with_expected_fields() {
        let value = serde_json::to_value(PluginSpec::default()).expect("serialize");
        assert_eq!(value["name"], "http-requests");
        assert_eq!(value["interfaces"][0], "reporter");
    }
}
