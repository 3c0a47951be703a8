//! Periodic sweep of expired contexts.

use crate::error::ContextError;
use crate::store::ContextManager;
use log::{debug, error, info};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle to the background cleanup task.
///
/// Dropping the handle leaves the task running for the life of the process.
#[derive(Debug)]
pub struct CleanupTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl CleanupTask {
    /// Signal the task to stop and wait for it to exit.
    pub async fn stop(self) -> Result<(), ContextError> {
        let _ = self.shutdown.send(true);
        self.handle
            .await
            .map_err(|err| ContextError::Task(err.to_string()))
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawn a task that sweeps immediately and then on every `interval` tick.
///
/// Must be called from within a tokio runtime. Sweeps run on the blocking
/// pool so a slow disk never stalls request handling.
pub fn spawn_cleanup_task(manager: ContextManager, interval: Duration) -> CleanupTask {
    let interval = interval.max(Duration::from_millis(1));
    let (shutdown, mut stop_rx) = watch::channel(false);
    info!(
        "starting context cleanup task (backend={}, interval_secs={})",
        manager.kind(),
        interval.as_secs()
    );
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut listening = true;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let sweeper = manager.clone();
                    match tokio::task::spawn_blocking(move || sweeper.cleanup_expired()).await {
                        Ok(removed) => debug!("context sweep finished (removed={removed})"),
                        Err(err) => error!("context sweep aborted: {err}"),
                    }
                }
                changed = stop_rx.changed(), if listening => match changed {
                    Ok(()) if *stop_rx.borrow() => break,
                    Ok(()) => {}
                    // Handle dropped without a stop request.
                    Err(_) => listening = false,
                },
            }
        }
        info!("context cleanup task stopped");
    });
    CleanupTask { shutdown, handle }
}

#[cfg(test)]
mod tests {
    use super::spawn_cleanup_task;
    use crate::expiry::{ExpiryAnchor, ExpiryPolicy};
    use crate::model::ContextRecord;
    use crate::store::{ContextManager, InMemoryContextStore};
    use chrono::Duration as TtlDuration;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn sweeps_on_start_and_stops_on_signal() {
        let store = Arc::new(InMemoryContextStore::new(ExpiryPolicy::new(
            TtlDuration::milliseconds(50),
            ExpiryAnchor::Created,
        )));
        let manager = ContextManager::new(store.clone());
        assert!(manager.save(&ContextRecord::new("C1")));
        assert_eq!(store.len(), 1);
        tokio::time::sleep(Duration::from_millis(100)).await;

        let task = spawn_cleanup_task(manager, Duration::from_secs(3600));
        for _ in 0..50 {
            if store.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(store.is_empty());

        task.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn dropped_handle_leaves_task_running() {
        let store = Arc::new(InMemoryContextStore::new(ExpiryPolicy::new(
            TtlDuration::milliseconds(20),
            ExpiryAnchor::Created,
        )));
        let manager = ContextManager::new(store.clone());
        drop(spawn_cleanup_task(manager.clone(), Duration::from_millis(10)));

        assert!(manager.save(&ContextRecord::new("C1")));
        for _ in 0..100 {
            if store.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn task_keeps_running_until_stopped() {
        let store = Arc::new(InMemoryContextStore::default());
        let manager = ContextManager::new(store);
        let task = spawn_cleanup_task(manager, Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());
        task.stop().await.expect("stop");
    }
}
