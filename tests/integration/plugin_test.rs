//! Integration tests for the plugin endpoint and sampling pipeline.
//!
//! These tests are implemented in:
//! `crates/httpmeter-plugin/tests/server_test.rs`
//!
//! Covered scenarios:
//! - `handshake_returns_static_capabilities`: Capability body fields
//! - `report_reflects_published_rates`: Node keys, samples, templates
//! - `report_with_empty_store_keeps_template_block`: Cold-start report
//! - `unknown_path_returns_404_with_empty_body`: Path dispatch fallback
//! - `connection_can_be_reused_for_a_second_request`: Keep-alive framing
//! - `bind_recovers_from_stale_socket_artifacts`: Restart over leftovers
//! - `client_disconnect_does_not_break_other_connections`: Isolation
