//! Wire-level constants and default paths.
//!
//! The name, description, interface list, metric identity, and socket
//! path are part of the plugin protocol contract with the topology
//! viewer; changing them changes what consumers see.

/// Plugin name reported in the capability handshake.
pub const PLUGIN_NAME: &str = "http-requests";

/// Human-readable plugin description reported in the handshake.
pub const PLUGIN_DESCRIPTION: &str = "Adds http request metrics to processes";

/// Interfaces this plugin implements. `reporter` marks it as a report
/// producer to the consumer.
pub const PLUGIN_INTERFACES: &[&str] = &["reporter"];

/// Plugin protocol API version.
pub const PLUGIN_API_VERSION: &str = "1";

/// Default unix socket path the plugin endpoint binds to.
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/scope/plugins/http_requests.sock";

/// Default sampling period in seconds.
pub const DEFAULT_SAMPLE_PERIOD_SECS: u64 = 1;

/// Identifier of the per-process rate metric in report documents.
pub const METRIC_ID: &str = "http_requests_per_second";

/// Display label for the rate metric.
pub const METRIC_LABEL: &str = "HTTP Req/Second";

/// Display priority for the rate metric (lower sorts first).
pub const METRIC_PRIORITY: f64 = 0.1;

/// Binary name for the agent.
pub const BIN_NAME: &str = "httpmeter";
