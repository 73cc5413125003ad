//! Periodic cache statistics in the log.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval_at};
use tracing::{debug, info};
use wagate_cache::TtlCache;

/// Background task logging a cache's counters at a fixed interval.
///
/// Stops on its own once the cache is destroyed. Dropping the reporter
/// aborts the task.
#[derive(Debug)]
pub struct StatsReporter {
    task: JoinHandle<()>,
}

impl StatsReporter {
    /// Spawn a reporter on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn<V>(label: &'static str, cache: TtlCache<V>, interval: Duration) -> Self
    where
        V: Clone + Send + Sync + 'static,
    {
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if cache.is_closed() {
                    debug!(cache = label, "Cache closed, stats reporter exiting");
                    break;
                }

                let stats = cache.stats();
                info!(
                    cache = label,
                    size = stats.size,
                    inserted = stats.inserted_total,
                    hits = stats.hit_total,
                    misses = stats.miss_total,
                    evicted = stats.evicted_total,
                    hit_rate = stats.hit_rate().unwrap_or(0.0),
                    "Cache stats"
                );
            }
        });

        Self { task }
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop reporting.
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for StatsReporter {
    fn drop(&mut self) {
        self.task.abort();
    }
}
