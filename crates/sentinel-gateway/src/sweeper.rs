//! Background stale-bucket sweeper.
//!
//! Optional companion to the engine's lazy, call-counted sweep: a tokio task
//! that evicts idle buckets on a fixed interval even when traffic is low. It
//! goes through [`TokenBucketEngine::sweep_stale`], so it takes the same lock
//! as regular admission checks.

use sentinel_kernel::limiter::TokenBucketEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Handle to a running sweeper; the task stops when the handle is dropped.
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn shutdown(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a task sweeping `engine` every `every`. Must be called inside a tokio runtime.
pub fn spawn_sweeper(engine: Arc<TokenBucketEngine>, every: Duration) -> SweeperHandle {
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let evicted = engine.sweep_stale();
            if evicted > 0 {
                debug!(evicted, tracked = engine.len(), "background sweep");
            }
        }
    });

    SweeperHandle { task }
}
