//! Background expiry sweeper.
//!
//! The [`Sweeper`] owns a Tokio task that calls
//! [`RecordStore::sweep`] once immediately and then on a fixed period.
//! Shutdown is signalled through a [`watch`] channel and checked before
//! every sweep, so once [`Sweeper::stop`] returns no sweep that has not
//! already started will run. A sweep already in progress is allowed to
//! finish.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::store::RecordStore;

/// Smallest period accepted by the scheduler.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to the running sweep task.
///
/// Dropping the handle also stops the task: the task exits once the
/// shutdown channel's sender is gone.
#[derive(Debug)]
pub struct Sweeper {
    shutdown_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Sweeper {
    /// Spawn the sweep task on the current Tokio runtime.
    ///
    /// The first sweep happens immediately; later sweeps follow every
    /// `interval`.
    pub fn start(store: Arc<RecordStore>, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let interval = interval.max(MIN_INTERVAL);
        let handle = tokio::spawn(run(store, interval, shutdown_rx));

        info!(interval_ms = interval.as_millis(), "sweeper started");

        Self {
            shutdown_tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Signal the task to stop. Safe to call any number of times.
    pub fn stop(&self) {
        let was_stopped = self.shutdown_tx.send_replace(true);
        if !was_stopped {
            info!("sweeper stop requested");
        }
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Stop the task and wait for it to exit.
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "sweeper task ended abnormally");
            }
            info!("sweeper stopped");
        }
    }
}

async fn run(store: Arc<RecordStore>, interval: Duration, mut shutdown_rx: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if *shutdown_rx.borrow() {
                    break;
                }
                sweep_once(&store);
            }
        }
    }
}

fn sweep_once(store: &RecordStore) {
    let removed = store.sweep(Utc::now());
    if removed > 0 {
        info!(removed, "expired records swept");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::config::StoreConfig;
    use crate::record::Candidate;

    fn expired_candidate(store: &RecordStore, job: &str) {
        let long_ago = Utc::now() - TimeDelta::hours(1);
        store.insert_at(Candidate::new("stale", job), long_ago);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeps_immediately_on_start() {
        let store = Arc::new(RecordStore::new(&StoreConfig::default()));
        expired_candidate(&store, "a");

        let sweeper = Sweeper::start(Arc::clone(&store), Duration::from_secs(30));
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(store.stats().total_expired, 1);
        assert!(store.is_empty());
        sweeper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn sweeps_again_each_period() {
        let store = Arc::new(RecordStore::new(&StoreConfig::default()));
        let sweeper = Sweeper::start(Arc::clone(&store), Duration::from_secs(30));
        tokio::time::sleep(Duration::from_millis(1)).await;

        expired_candidate(&store, "b");
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(store.len(), 1, "no sweep before the period elapses");

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert!(store.is_empty());
        assert_eq!(store.stats().total_expired, 1);
        sweeper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn no_sweep_after_stop() {
        let store = Arc::new(RecordStore::new(&StoreConfig::default()));
        let sweeper = Sweeper::start(Arc::clone(&store), Duration::from_secs(30));
        tokio::time::sleep(Duration::from_millis(1)).await;

        sweeper.stop();
        sweeper.stop();
        assert!(sweeper.is_stopped());

        expired_candidate(&store, "c");
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().total_expired, 0);

        sweeper.shutdown().await;
        sweeper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_ends_the_task() {
        let store = Arc::new(RecordStore::new(&StoreConfig::default()));
        let sweeper = Sweeper::start(Arc::clone(&store), Duration::from_secs(30));
        tokio::time::sleep(Duration::from_millis(1)).await;
        drop(sweeper);

        expired_candidate(&store, "d");
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(store.len(), 1);
        assert_eq!(Arc::strong_count(&store), 1);
    }
}
