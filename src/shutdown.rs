//! Cooperative cancellation shared by the ingestion task and the render loop.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

/// A cloneable shutdown signal.
///
/// Every clone observes the same flag. Once triggered it stays triggered.
///
/// # Example
///
/// ```
/// use powerwatch::Shutdown;
///
/// # tokio_test::block_on(async {
/// let shutdown = Shutdown::new();
/// let observer = shutdown.clone();
/// shutdown.trigger();
/// observer.triggered().await;
/// assert!(observer.is_triggered());
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Shutdown {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn trigger(&self) {
        if !self.sender.send_replace(true) {
            info!("shutdown requested");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once [`trigger`](Self::trigger) has been called on any clone.
    ///
    /// Cancel safe: dropping the future and calling it again never misses a
    /// trigger that happened in between.
    pub async fn triggered(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }
}
