//! Channel delivery for engines that queue notifications
//!
//! Some engines push `(code, arg1, arg2)` tuples onto a queue instead of
//! calling back. The sender side is synchronous so it can be used from any
//! engine thread; the receiver is drained by an async task that folds every
//! notification through the coordinator's [`Dispatcher`].

use crate::coordinator::Dispatcher;
use crate::event::EngineNotification;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Create a connected sender/receiver pair
pub fn notification_channel() -> (NotificationSender, NotificationReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NotificationSender { tx }, NotificationReceiver { rx })
}

/// Engine-side handle
#[derive(Debug, Clone)]
pub struct NotificationSender {
    tx: mpsc::UnboundedSender<EngineNotification>,
}

impl NotificationSender {
    /// Queue a notification; false once the receiver is gone
    pub fn send(&self, notification: impl Into<EngineNotification>) -> bool {
        self.tx.send(notification.into()).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Coordinator-side handle
#[derive(Debug)]
pub struct NotificationReceiver {
    rx: mpsc::UnboundedReceiver<EngineNotification>,
}

impl NotificationReceiver {
    /// Fold queued notifications until every sender is dropped or the
    /// session is released; returns how many were delivered
    pub async fn forward(mut self, dispatcher: Dispatcher) -> usize {
        let mut forwarded = 0;

        while let Some(notification) = self.rx.recv().await {
            if dispatcher.is_closed() {
                debug!(forwarded, "Session closed, forwarding stopped");
                break;
            }
            dispatcher.dispatch(notification);
            forwarded += 1;
        }

        forwarded
    }

    /// Run [`forward`](Self::forward) on the current tokio runtime
    pub fn spawn_forwarder(self, dispatcher: Dispatcher) -> JoinHandle<usize> {
        tokio::spawn(self.forward(dispatcher))
    }
}
