//! Periodic rate derivation.
//!
//! Each tick reads the counter source, turns absolute counters into
//! per-interval rates against the previous tick's baseline, and
//! publishes the result to the rate store as one atomic replacement.

use std::sync::Arc;
use std::time::Duration;

use httpmeter_common::error::Result;
use httpmeter_common::types::{CounterSnapshot, RateSnapshot};

use crate::source::CounterSource;
use crate::store::RateStore;

/// Derives per-interval rates from two successive counter snapshots.
///
/// Policy:
/// - a pid present in both snapshots gets `current - previous`; no
///   clamping, so a decreased counter yields a negative rate;
/// - a pid seen for the first time gets its absolute counter as the
///   rate — the defined first-tick policy, kept because consumers
///   already interpret process start-up this way;
/// - a pid present only in the previous snapshot is dropped, with no
///   decay or carry-forward.
#[must_use]
pub fn rates_between(prev: &CounterSnapshot, current: &CounterSnapshot) -> RateSnapshot {
    current
        .iter()
        .map(|(pid, count)| {
            let rate = match prev.get(pid) {
                Some(baseline) => count as i64 - baseline as i64,
                None => count as i64,
            };
            (pid, rate)
        })
        .collect()
}

/// Periodic task that keeps the rate store current.
///
/// Owns its counter source and a handle to the shared store; runs until
/// the process exits or the source fails.
#[derive(Debug)]
pub struct Sampler<C> {
    source: C,
    store: Arc<RateStore>,
    period: Duration,
}

impl<C: CounterSource> Sampler<C> {
    /// Creates a sampler publishing into `store` every `period`.
    pub fn new(source: C, store: Arc<RateStore>, period: Duration) -> Self {
        Self {
            source,
            store,
            period,
        }
    }

    /// Runs the sampling loop indefinitely.
    ///
    /// The first enumeration happens one full period after start, so the
    /// first published snapshot reflects one period of accumulation.
    /// Clearing the source table each tick would be cheaper to reason
    /// about, but clearing contends with the instrumentation side's
    /// increments; deriving deltas from a retained baseline does not.
    ///
    /// # Errors
    ///
    /// Returns when the counter source fails to enumerate. The source
    /// has no defined partial-failure mode, so there is nothing to skip
    /// over; the caller decides whether that ends the process.
    pub async fn run(self) -> Result<()> {
        let mut baseline = CounterSnapshot::new();
        loop {
            tokio::time::sleep(self.period).await;
            let current = self.source.enumerate()?;
            let rates = rates_between(&baseline, &current);
            tracing::trace!(processes = rates.len(), "publishing rate snapshot");
            self.store.publish(rates);
            baseline = current;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use httpmeter_common::error::HttpmeterError;
    use httpmeter_common::types::ProcessId;

    use super::*;

    fn counters(entries: &[(u32, u64)]) -> CounterSnapshot {
        entries
            .iter()
            .map(|&(pid, count)| (ProcessId::new(pid), count))
            .collect()
    }

    #[test]
    fn continuous_pid_gets_the_delta() {
        let prev = counters(&[(1, 5)]);
        let current = counters(&[(1, 12), (2, 3)]);

        let rates = rates_between(&prev, &current);
        assert_eq!(rates.get(ProcessId::new(1)), Some(7));
        assert_eq!(rates.get(ProcessId::new(2)), Some(3));
    }

    #[test]
    fn first_observation_reports_the_absolute_counter() {
        let rates = rates_between(&CounterSnapshot::new(), &counters(&[(9, 41)]));
        assert_eq!(rates.get(ProcessId::new(9)), Some(41));
    }

    #[test]
    fn exited_pid_is_dropped() {
        let prev = counters(&[(1, 5), (2, 8)]);
        let current = counters(&[(1, 6)]);

        let rates = rates_between(&prev, &current);
        assert_eq!(rates.len(), 1);
        assert_eq!(rates.get(ProcessId::new(2)), None);
    }

    #[test]
    fn decreased_counter_yields_a_negative_rate() {
        let rates = rates_between(&counters(&[(1, 10)]), &counters(&[(1, 4)]));
        assert_eq!(rates.get(ProcessId::new(1)), Some(-6));
    }

    #[test]
    fn unchanged_counter_yields_zero() {
        let rates = rates_between(&counters(&[(1, 10)]), &counters(&[(1, 10)]));
        assert_eq!(rates.get(ProcessId::new(1)), Some(0));
    }

    /// Counter source that replays a fixed sequence of enumerations.
    struct ScriptedSource {
        ticks: Mutex<VecDeque<Result<CounterSnapshot>>>,
    }

    impl ScriptedSource {
        fn new(ticks: Vec<Result<CounterSnapshot>>) -> Self {
            Self {
                ticks: Mutex::new(ticks.into_iter().collect()),
            }
        }
    }

    impl CounterSource for ScriptedSource {
        fn enumerate(&self) -> Result<CounterSnapshot> {
            let mut ticks = self.ticks.lock().expect("ticks lock");
            ticks.pop_front().unwrap_or_else(|| {
                Err(HttpmeterError::Source {
                    message: "script exhausted".into(),
                })
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn loop_publishes_each_tick_and_rebaselines() {
        let source = ScriptedSource::new(vec![
            Ok(counters(&[(1, 5)])),
            Ok(counters(&[(1, 12), (2, 3)])),
        ]);
        let store = Arc::new(RateStore::new());
        let sampler = Sampler::new(source, Arc::clone(&store), Duration::from_secs(1));

        let result = sampler.run().await;
        assert!(result.is_err(), "exhausted script must stop the loop");

        // Last published snapshot is the delta of tick 2 against tick 1.
        store.read(|snap| {
            assert_eq!(snap.get(ProcessId::new(1)), Some(7));
            assert_eq!(snap.get(ProcessId::new(2)), Some(3));
        });
    }

    #[tokio::test(start_paused = true)]
    async fn source_failure_is_fatal_and_keeps_the_last_snapshot() {
        let source = ScriptedSource::new(vec![
            Ok(counters(&[(1, 4)])),
            Err(HttpmeterError::Source {
                message: "table gone".into(),
            }),
        ]);
        let store = Arc::new(RateStore::new());
        let sampler = Sampler::new(source, Arc::clone(&store), Duration::from_secs(1));

        let result = sampler.run().await;
        assert!(result.is_err());

        // Readers keep serving the last successful snapshot.
        store.read(|snap| assert_eq!(snap.get(ProcessId::new(1)), Some(4)));
    }
}
