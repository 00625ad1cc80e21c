//! Background eviction of expired cache entries.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use crate::cache::ExpiringCache;

/// Handle to a background sweep task.
///
/// The task only holds a weak reference to its cache and stops on
/// [`close`](Sweeper::close), when the handle is dropped, or once the cache
/// itself is gone.
pub struct Sweeper {
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawns a sweeper using the cache's configured interval.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<V>(cache: &Arc<ExpiringCache<V>>) -> Self
    where
        V: Clone + Send + Sync + 'static,
    {
        let interval = cache.config().sweep_interval;
        Self::spawn_with_interval(cache, interval)
    }

    /// Spawns a sweeper with an explicit interval.
    pub fn spawn_with_interval<V>(cache: &Arc<ExpiringCache<V>>, interval: Duration) -> Self
    where
        V: Clone + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(cache);
        let batch_size = cache.config().sweep_batch_size;
        let interval = interval.max(Duration::from_millis(1));
        let (shutdown, signal) = watch::channel(false);

        let handle = tokio::spawn(run(weak, interval, batch_size, signal));
        debug!(?interval, batch_size, "Cache sweeper started");

        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Returns true while the background task is alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the sweeper and waits for the task to exit.
    pub async fn close(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.shutdown.send(true);
        }
    }
}

async fn run<V>(
    cache: Weak<ExpiringCache<V>>,
    interval: Duration,
    batch_size: usize,
    mut signal: watch::Receiver<bool>,
) where
    V: Clone + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; nothing can have expired yet.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let removed = cache.sweep_expired(batch_size);
                if removed > 0 {
                    debug!(removed, remaining = cache.len(), "Swept expired cache entries");
                } else {
                    trace!("Sweep found nothing to evict");
                }
            }
            changed = signal.changed() => {
                if changed.is_err() || *signal.borrow() {
                    break;
                }
            }
        }
    }

    debug!("Cache sweeper stopped");
}
