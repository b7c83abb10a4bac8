//! # Live Tail Watcher
//!
//! Consumes "a matching log appeared" signals from a standing subscription and
//! merges fresh values into the shared [`SyncFeed`](crate::sync_feed::SyncFeed)
//! without reprocessing history.
//!
//! Each signal triggers a single authoritative "read current value" call
//! against contract state rather than a log re-decode; the feed's head
//! de-duplication absorbs double fires. Naive log subscriptions often emit
//! once immediately upon creation as a replay of already-known state, so the
//! watcher takes an explicit `skip_initial_firing` flag instead of a hidden
//! first-run latch.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::sync_feed::SyncFeed;

/// Direct contract state read used after each tail signal.
#[async_trait]
pub trait CurrentValueReader<T>: Send + Sync {
    async fn read_current(&self) -> anyhow::Result<T>;
}

/// The underlying subscription dropped. Re-subscription is a caller concern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    #[error("log subscription stream closed unexpectedly")]
    StreamClosed,
}

/// Handle to a running tail watcher. Dropping it closes the shutdown channel,
/// which stops the watcher task on its next poll; call
/// [`unsubscribe`](TailWatcherHandle::unsubscribe) to also wait for wind-down
/// and tear down the owned subscription bridge.
pub struct TailWatcherHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Result<(), SubscriptionError>>,
    bridge: Option<JoinHandle<()>>,
}

impl TailWatcherHandle {
    /// Attach the task that forwards raw subscription output into the signal
    /// channel, so teardown stops it together with the watcher.
    pub fn with_bridge_task(mut self, bridge: JoinHandle<()>) -> Self {
        self.bridge = Some(bridge);
        self
    }

    /// Stop the watcher and wait for its task to wind down. No background
    /// work continues after this returns.
    pub async fn unsubscribe(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
        Self::stop_bridge(self.bridge).await;
    }

    /// Wait for the watcher to exit on its own; surfaces the subscription
    /// drop the same way the caller would see any other capability failure.
    pub async fn join(self) -> Result<(), SubscriptionError> {
        let result = self
            .task
            .await
            .unwrap_or(Err(SubscriptionError::StreamClosed));
        Self::stop_bridge(self.bridge).await;
        result
    }

    async fn stop_bridge(bridge: Option<JoinHandle<()>>) {
        if let Some(bridge) = bridge {
            bridge.abort();
            let _ = bridge.await;
        }
    }
}

/// Spawn a watcher draining `events` (one `()` per matching log) into `feed`.
pub fn spawn_tail_watcher<T, R>(
    mut events: mpsc::Receiver<()>,
    reader: Arc<R>,
    feed: SyncFeed<T>,
    skip_initial_firing: bool,
) -> TailWatcherHandle
where
    T: Clone + PartialEq + Send + Sync + 'static,
    R: CurrentValueReader<T> + ?Sized + 'static,
{
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut skip_next = skip_initial_firing;
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    debug!("🛑 [TailWatcher] Unsubscribed, stopping");
                    return Ok(());
                }
                maybe_signal = events.recv() => {
                    match maybe_signal {
                        None => {
                            warn!("⚠️ [TailWatcher] Subscription stream closed");
                            return Err(SubscriptionError::StreamClosed);
                        }
                        Some(()) => {
                            if skip_next {
                                skip_next = false;
                                debug!("🔁 [TailWatcher] Skipping initial subscription replay");
                                continue;
                            }
                            match reader.read_current().await {
                                Ok(value) => {
                                    if feed.push_head(value) {
                                        info!("✅ [TailWatcher] Merged fresh head value into feed");
                                    }
                                }
                                // Read failures are transient; the next signal retries.
                                Err(e) => warn!("⚠️ [TailWatcher] read_current failed: {e:#}"),
                            }
                        }
                    }
                }
            }
        }
    });

    TailWatcherHandle {
        shutdown,
        task,
        bridge: None,
    }
}
