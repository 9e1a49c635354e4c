//! Domain primitive types used across the httpmeter workspace.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Kernel process identifier, as keyed by the counter source.
///
/// Opaque to this workspace: pids are never allocated here, only read
/// back from the instrumentation table. A pid may be reused by the
/// kernel after the process dies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProcessId(u32);

impl ProcessId {
    /// Creates a process ID from a raw kernel pid.
    #[must_use]
    pub const fn new(pid: u32) -> Self {
        Self(pid)
    }

    /// Returns the raw kernel pid.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl From<u32> for ProcessId {
    fn from(pid: u32) -> Self {
        Self(pid)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Absolute per-process request counts, captured at one sampling tick.
///
/// Immutable once captured; each tick supersedes the previous snapshot
/// wholesale. Counters are monotonically non-decreasing while the
/// process they belong to is alive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    counts: BTreeMap<ProcessId, u64>,
}

impl CounterSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the absolute counter for `pid`.
    pub fn set(&mut self, pid: ProcessId, count: u64) {
        let _ = self.counts.insert(pid, count);
    }

    /// Returns the counter for `pid`, if present.
    #[must_use]
    pub fn get(&self, pid: ProcessId) -> Option<u64> {
        self.counts.get(&pid).copied()
    }

    /// Iterates over all `(pid, counter)` entries in pid order.
    pub fn iter(&self) -> impl Iterator<Item = (ProcessId, u64)> + '_ {
        self.counts.iter().map(|(&pid, &count)| (pid, count))
    }

    /// Number of processes in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether the snapshot holds no processes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(ProcessId, u64)> for CounterSnapshot {
    fn from_iter<I: IntoIterator<Item = (ProcessId, u64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}

/// Derived per-interval request rates, one entry per observed process.
///
/// Exactly one rate snapshot is current at any time; the sampler
/// replaces it atomically at each tick, never merging into it. Rates are
/// signed: no clamping is applied, so a counter that ever decreased
/// shows up as a negative rate rather than being masked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSnapshot {
    rates: BTreeMap<ProcessId, i64>,
}

impl RateSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the rate for `pid`.
    pub fn set(&mut self, pid: ProcessId, rate: i64) {
        let _ = self.rates.insert(pid, rate);
    }

    /// Returns the rate for `pid`, if present.
    #[must_use]
    pub fn get(&self, pid: ProcessId) -> Option<i64> {
        self.rates.get(&pid).copied()
    }

    /// Iterates over all `(pid, rate)` entries in pid order.
    pub fn iter(&self) -> impl Iterator<Item = (ProcessId, i64)> + '_ {
        self.rates.iter().map(|(&pid, &rate)| (pid, rate))
    }

    /// Number of processes in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Whether the snapshot holds no processes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl FromIterator<(ProcessId, i64)> for RateSnapshot {
    fn from_iter<I: IntoIterator<Item = (ProcessId, i64)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().collect(),
        }
    }
}
