//! Resource subscriptions and the periodic update broadcast.
//!
//! The registry is a plain set of URIs with no per-client bookkeeping. The
//! notifier emits one `ResourceUpdated` per subscribed URI on every tick,
//! whether or not the note changed.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashSet;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Payload of a `notifications/resources/updated` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceUpdated {
    pub uri: String,
}

/// Set of subscribed resource URIs.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    uris: DashSet<String>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `uri`. Returns false if it was already present.
    pub fn subscribe(&self, uri: &str) -> bool {
        self.uris.insert(uri.to_string())
    }

    /// Remove `uri`. Returns false if it was not present.
    pub fn unsubscribe(&self, uri: &str) -> bool {
        self.uris.remove(uri).is_some()
    }

    /// Sorted copy of the subscribed URIs.
    pub fn snapshot(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.uris.iter().map(|u| u.key().clone()).collect();
        uris.sort();
        uris
    }

    pub fn len(&self) -> usize {
        self.uris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }
}

/// Background task broadcasting updates for every subscribed URI.
///
/// Stopping is idempotent and also happens on drop.
pub struct UpdateNotifier {
    shutdown: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl UpdateNotifier {
    /// Spawn the broadcast loop. The first tick fires one `period` after start.
    pub fn start(
        subscriptions: Arc<SubscriptionRegistry>,
        period: Duration,
        tx: mpsc::Sender<ResourceUpdated>,
    ) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        for uri in subscriptions.snapshot() {
                            if tx.send(ResourceUpdated { uri }).await.is_err() {
                                debug!("Update receiver closed, stopping notifier");
                                return;
                            }
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            return;
                        }
                    }
                }
            }
        });

        info!("Resource update notifier started (every {:?})", period);
        Self {
            shutdown,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Stop the loop. Returns true only for the call that actually stopped it.
    pub fn stop(&self) -> bool {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        match handle {
            Some(handle) => {
                let _ = self.shutdown.send(true);
                handle.abort();
                info!("Resource update notifier stopped");
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for UpdateNotifier {
    fn drop(&mut self) {
        self.stop();
    }
}
