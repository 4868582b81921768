//! Expiration Sweeper
//!
//! Background task that periodically removes expired cache entries.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::Cache;

// == Sweeper Handle ==
/// Stop handle for a running sweeper.
///
/// Dropping the handle stops the sweeper as well.
#[derive(Debug)]
pub struct SweeperHandle {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the sweeper to stop and waits for its task to finish.
    ///
    /// A sweep already in progress completes before the task exits; no
    /// further sweeps start afterwards.
    pub async fn stop(self) {
        // The task may already be gone; both outcomes stop it.
        let _ = self.stop_tx.send(());
        let _ = self.task.await;
    }

    /// Returns true once the sweeper task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns a task that purges expired entries from `cache` every `interval`.
///
/// Must be called from within a tokio runtime. The first sweep runs one
/// `interval` after the call. Each sweep evaluates expiry against the tick's
/// timestamp.
///
/// # Panics
/// Panics if `interval` is zero, as `tokio::time::interval` does.
pub fn start_sweeper(cache: Cache, interval: Duration) -> SweeperHandle {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        info!(?interval, "Starting expiration sweeper");

        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Resolves on an explicit stop and on a dropped handle
                _ = &mut stop_rx => break,
                tick = ticker.tick() => {
                    let removed = cache.purge_expired(tick.into_std());

                    if removed > 0 {
                        info!("Sweep: removed {} expired entries", removed);
                    } else {
                        debug!("Sweep: no expired entries found");
                    }
                }
            }
        }

        info!("Expiration sweeper stopped");
    });

    SweeperHandle { stop_tx, task }
}
