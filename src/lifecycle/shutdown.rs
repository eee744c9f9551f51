//! Shutdown coordination for the service.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Running,
    Draining,
    Forced,
}

/// Coordinator for graceful shutdown.
///
/// Level-triggered: a listener that subscribes after [`Shutdown::trigger`]
/// still observes the request. Clones share the same state, so any clone can
/// act as the handle tests use to stop a server.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<Phase>>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Phase::Running);
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Request graceful shutdown. Idempotent.
    pub fn trigger(&self) {
        self.advance(Phase::Draining);
    }

    /// Abandon the drain: the server stops waiting for in-flight requests.
    pub fn force(&self) {
        self.advance(Phase::Forced);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow() != Phase::Running
    }

    fn advance(&self, to: Phase) {
        self.tx.send_if_modified(|phase| {
            if *phase < to {
                *phase = to;
                true
            } else {
                false
            }
        });
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of [`Shutdown`].
#[derive(Debug)]
pub struct ShutdownListener {
    rx: watch::Receiver<Phase>,
}

impl ShutdownListener {
    /// Resolve once shutdown has been requested.
    pub async fn recv(&mut self) {
        // The sender lives as long as any Shutdown clone; losing it also means stop.
        let _ = self.rx.wait_for(|phase| *phase != Phase::Running).await;
    }

    /// Resolve once the drain has been abandoned.
    pub async fn forced(&mut self) {
        if self.rx.wait_for(|phase| *phase == Phase::Forced).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_listener() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.subscribe();

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.trigger();
        });

        tokio::time::timeout(Duration::from_secs(1), listener.recv())
            .await
            .expect("listener should wake");
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.trigger();

        let mut listener = shutdown.subscribe();
        tokio::time::timeout(Duration::from_millis(100), listener.recv())
            .await
            .expect("already triggered");
    }

    #[tokio::test]
    async fn test_force_follows_trigger_only_when_asked() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.subscribe();

        shutdown.trigger();
        let waited = tokio::time::timeout(Duration::from_millis(50), listener.forced()).await;
        assert!(waited.is_err());

        shutdown.force();
        shutdown.trigger();
        tokio::time::timeout(Duration::from_millis(100), listener.forced())
            .await
            .expect("forced");
        tokio::time::timeout(Duration::from_millis(100), listener.recv())
            .await
            .expect("forcing also counts as a shutdown request");
    }
}
