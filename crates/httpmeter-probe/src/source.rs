//! Counter source seam.
//!
//! The per-process request counters are maintained outside this crate by
//! an instrumentation collaborator (in deployment, a kernel probe that
//! increments a map entry per served request). This module only defines
//! the read side: a one-method trait for enumerating the table, and a
//! shared in-process table that implements it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use httpmeter_common::error::Result;
use httpmeter_common::types::{CounterSnapshot, ProcessId};

/// Read-only access to the externally maintained counter table.
///
/// Counters are monotonically non-decreasing per live process; this
/// trait never mutates the table. Enumeration has no partial-failure
/// mode: it either yields the full table or fails.
pub trait CounterSource: Send + 'static {
    /// Captures the current state of the per-process counter table.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying table cannot be read.
    fn enumerate(&self) -> Result<CounterSnapshot>;
}

/// Shared per-process request counter table.
///
/// The concrete integration point between the instrumentation
/// collaborator and the sampler: the instrumentation side holds a clone
/// and records requests as they are observed, the sampler enumerates.
/// Clones share the same underlying table.
///
/// Entries are never aged out here; a process that exits leaves its
/// counter behind until the collaborator that detected the death calls
/// [`CounterTable::remove`].
#[derive(Debug, Clone, Default)]
pub struct CounterTable {
    counts: Arc<Mutex<BTreeMap<ProcessId, u64>>>,
}

impl CounterTable {
    /// Creates an empty counter table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one observed request for `pid`.
    pub fn observe_request(&self, pid: ProcessId) {
        self.observe_requests(pid, 1);
    }

    /// Records `count` observed requests for `pid`.
    pub fn observe_requests(&self, pid: ProcessId, count: u64) {
        let mut counts = self.lock();
        let entry = counts.entry(pid).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    /// Removes the entry for `pid`.
    ///
    /// Hook for a death-detection collaborator; nothing in this
    /// workspace calls it on its own.
    pub fn remove(&self, pid: ProcessId) {
        let _ = self.lock().remove(&pid);
    }

    /// Number of processes currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<ProcessId, u64>> {
        // A panic while holding the lock leaves the counters intact, so
        // the poisoned state is still usable.
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CounterSource for CounterTable {
    fn enumerate(&self) -> Result<CounterSnapshot> {
        let counts = self.lock();
        Ok(counts.iter().map(|(&pid, &count)| (pid, count)).collect())
    }
}
