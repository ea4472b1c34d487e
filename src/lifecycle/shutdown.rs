//! Shutdown coordination for the query server.

use std::time::Duration;

use tokio::sync::broadcast;

use crate::net::ConnectionTracker;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Wait for in-flight connections to finish, up to `grace`.
    ///
    /// Returns false if connections were still open at the deadline.
    pub async fn drain(&self, tracker: &ConnectionTracker, grace: Duration) -> bool {
        let remaining = tracker.active_count();
        if remaining == 0 {
            return true;
        }

        tracing::info!(active_connections = remaining, grace_secs = grace.as_secs(), "Draining connections");
        let drained = tracker.wait_for_drain(grace).await;
        if !drained {
            tracing::warn!(
                active_connections = tracker.active_count(),
                "Grace period elapsed with connections still open"
            );
        }
        drained
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_trigger() {
        let shutdown = Shutdown::new();
        let mut rx1 = shutdown.subscribe();
        let mut rx2 = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 2);

        shutdown.trigger();
        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn drain_respects_grace() {
        let shutdown = Shutdown::new();
        let tracker = ConnectionTracker::new();
        assert!(shutdown.drain(&tracker, Duration::from_millis(10)).await);

        let _guard = tracker.track();
        assert!(!shutdown.drain(&tracker, Duration::from_millis(60)).await);
    }
}
