//! Background sweep of expired entries.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::cache::Shared;

/// Owned handle to a running sweep task.
#[derive(Debug)]
pub(crate) struct SweepHandle {
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Stop the task. Takes effect at its next await point at the latest.
    pub(crate) fn cancel(self) {
        self.task.abort();
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Dropped with the task's future, whether it ends, is aborted, or is
/// discarded by a runtime shutting down.
struct StopNotice<V> {
    shared: Weak<Shared<V>>,
}

impl<V> Drop for StopNotice<V> {
    fn drop(&mut self) {
        if let Some(cache) = self.shared.upgrade()
            && !cache.is_closed()
        {
            warn!(
                "Cache sweep stopped while the cache is still open, expired entries will only be removed on access"
            );
        }
    }
}

/// Spawn the sweep on the current tokio runtime, if there is one.
pub(crate) fn spawn<V>(
    shared: Weak<Shared<V>>,
    interval: Duration,
    batch_size: usize,
) -> Option<SweepHandle>
where
    V: Send + Sync + 'static,
{
    let runtime = tokio::runtime::Handle::try_current().ok()?;
    let notice = StopNotice {
        shared: shared.clone(),
    };
    let task = runtime.spawn(async move {
        let _notice = notice;
        run(shared, interval, batch_size.max(1)).await;
    });
    Some(SweepHandle { task })
}

async fn run<V>(shared: Weak<Shared<V>>, interval: Duration, batch_size: usize)
where
    V: Send + Sync + 'static,
{
    let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(cache) = shared.upgrade() else {
            trace!("Cache dropped, stopping sweep");
            break;
        };
        if cache.is_closed() {
            break;
        }

        let removed = sweep_in_batches(&cache, batch_size).await;
        if removed > 0 {
            debug!(
                removed = removed,
                remaining = cache.len(),
                "Swept expired cache entries"
            );
        }
    }
}

/// Collect under the read lock, then remove in batches, yielding between
/// batches so foreground callers get the lock.
async fn sweep_in_batches<V>(cache: &Shared<V>, batch_size: usize) -> usize {
    let expired = cache.collect_expired();
    let mut removed = 0;
    for chunk in expired.chunks(batch_size) {
        removed += cache.remove_expired(chunk);
        tokio::task::yield_now().await;
    }
    removed
}
