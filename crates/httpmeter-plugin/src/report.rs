//! Report document model and assembly.
//!
//! A report attaches one metric, the per-process request rate, to nodes
//! of the consumer's `Process` topology. Node keys combine the kernel
//! pid with the local host name so the consumer can match them against
//! the processes it already knows about.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use httpmeter_common::constants;
use httpmeter_common::types::{ProcessId, RateSnapshot};
use serde::{Deserialize, Serialize};

/// One timestamped metric observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Observation time, UTC ISO-8601 with `Z` suffix.
    pub date: String,
    /// Observed rate.
    pub value: i64,
}

/// A metric carried by a node: a short series of samples.
///
/// This plugin always sends exactly one sample per report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Samples in observation order.
    pub samples: Vec<Sample>,
}

/// Metrics attached to one process node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessNode {
    /// Metric id to metric payload.
    pub metrics: BTreeMap<String, Metric>,
}

/// Rendering instructions for a metric, keyed by metric id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTemplate {
    /// Metric identifier; matches the key under `metrics`.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Display priority, lower sorts first.
    pub priority: f64,
}

impl MetricTemplate {
    /// The request-rate template this plugin always declares.
    #[must_use]
    pub fn requests_per_second() -> Self {
        Self {
            id: constants::METRIC_ID.into(),
            label: constants::METRIC_LABEL.into(),
            priority: constants::METRIC_PRIORITY,
        }
    }
}

/// One topology section of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    /// Node key to node payload.
    pub nodes: BTreeMap<String, ProcessNode>,
    /// Metric id to rendering template; present even when `nodes` is
    /// empty so the consumer can register the metric up front.
    pub metric_templates: BTreeMap<String, MetricTemplate>,
}

/// Top-level report document sent on `GET /report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// The `Process` topology this plugin decorates.
    #[serde(rename = "Process")]
    pub process: Topology,
}

impl Report {
    /// Builds a report from a rate snapshot.
    ///
    /// Every process in the snapshot becomes one node carrying a single
    /// sample stamped `date`; the metric template block is attached
    /// unconditionally.
    #[must_use]
    pub fn from_rates(rates: &RateSnapshot, hostname: &str, date: &str) -> Self {
        let nodes = rates
            .iter()
            .map(|(pid, rate)| {
                let metric = Metric {
                    samples: vec![Sample {
                        date: date.to_owned(),
                        value: rate,
                    }],
                };
                let node = ProcessNode {
                    metrics: BTreeMap::from([(constants::METRIC_ID.to_owned(), metric)]),
                };
                (node_key(pid, hostname), node)
            })
            .collect();

        Self {
            process: Topology {
                nodes,
                metric_templates: BTreeMap::from([(
                    constants::METRIC_ID.to_owned(),
                    MetricTemplate::requests_per_second(),
                )]),
            },
        }
    }
}

/// Composite node key matching the consumer's process node identifiers:
/// the raw pid, a semicolon, and the host name in angle brackets.
#[must_use]
pub fn node_key(pid: ProcessId, hostname: &str) -> String {
    format!("{pid};<{hostname}>")
}

/// Current wall-clock time in the report timestamp format
/// (RFC 3339, microsecond precision, `Z` suffix).
#[must_use]
pub fn current_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
