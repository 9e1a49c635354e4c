//! Single-writer/multi-reader handoff of the latest rate snapshot.

use std::sync::{Mutex, MutexGuard, PoisonError};

use httpmeter_common::types::RateSnapshot;

/// Holder of the most recently published rate snapshot.
///
/// One writer (the sampler) replaces the snapshot wholesale; any number
/// of readers observe it through [`RateStore::read`]. A reader never
/// sees a snapshot that mixes entries from two different ticks.
///
/// Starts out holding an empty snapshot, so readers that arrive before
/// the first sampler tick see "no processes" rather than an error.
#[derive(Debug, Default)]
pub struct RateStore {
    current: Mutex<RateSnapshot>,
}

impl RateStore {
    /// Creates a store holding an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current snapshot.
    ///
    /// The swap is all-or-nothing: readers see either the previous
    /// snapshot or this one in full, never a partial state.
    pub fn publish(&self, snapshot: RateSnapshot) {
        *self.lock() = snapshot;
    }

    /// Runs `f` against the current snapshot, excluding concurrent
    /// publishes for the duration of the call.
    ///
    /// This is the only read primitive; callers copy out what they need
    /// and must not block inside `f`, since the sampler's next publish
    /// waits on it.
    pub fn read<T>(&self, f: impl FnOnce(&RateSnapshot) -> T) -> T {
        f(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, RateSnapshot> {
        // Snapshots are replaced atomically, so a poisoned lock still
        // guards a consistent value.
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use httpmeter_common::types::ProcessId;

    use super::*;

    #[test]
    fn starts_empty() {
        let store = RateStore::new();
        assert!(store.read(RateSnapshot::is_empty));
    }

    #[test]
    fn publish_replaces_wholesale() {
        let store = RateStore::new();
        store.publish([(ProcessId::new(1), 5), (ProcessId::new(2), 1)].into_iter().collect());
        store.publish([(ProcessId::new(3), 9)].into_iter().collect());

        store.read(|snap| {
            assert_eq!(snap.len(), 1);
            assert_eq!(snap.get(ProcessId::new(3)), Some(9));
            assert_eq!(snap.get(ProcessId::new(1)), None);
        });
    }

    #[test]
    fn read_returns_the_closure_result() {
        let store = RateStore::new();
        store.publish([(ProcessId::new(4), 2)].into_iter().collect());
        let total: i64 = store.read(|snap| snap.iter().map(|(_, rate)| rate).sum());
        assert_eq!(total, 2);
    }

    /// Publishes snapshots whose entries all carry the tick number as the
    /// rate; concurrent readers must never observe two different values
    /// in one snapshot.
    #[test]
    fn readers_never_observe_a_mixed_snapshot() {
        const TICKS: i64 = 500;
        const PIDS: u32 = 32;

        let store = Arc::new(RateStore::new());
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                for tick in 0..TICKS {
                    store.publish((0..PIDS).map(|pid| (ProcessId::new(pid), tick)).collect());
                }
                done.store(true, Ordering::Release);
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    while !done.load(Ordering::Acquire) {
                        store.read(|snap| {
                            let mut values = snap.iter().map(|(_, rate)| rate);
                            if let Some(first) = values.next() {
                                assert!(
                                    values.all(|value| value == first),
                                    "snapshot mixes entries from different ticks"
                                );
                                assert_eq!(snap.len(), PIDS as usize);
                            }
                        });
                    }
                })
            })
            .collect();

        writer.join().expect("writer");
        for reader in readers {
            reader.join().expect("reader");
        }
    }
}
