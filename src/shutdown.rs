//! Listens for the server-wide shutdown signal.
//!
//! Every connection handler holds one of these, subscribed to the same `broadcast::Sender` the
//! server drops when it begins shutting down. A broadcast channel (rather than a plain oneshot)
//! is used because an arbitrary number of handlers need to observe the same signal.

use tokio::sync::broadcast;

#[derive(Debug)]
pub(crate) struct Shutdown {
    /// `true` once the shutdown signal has been received.
    is_shutdown: bool,

    /// The receive half of the channel used to listen for shutdown.
    notify: broadcast::Receiver<()>,
}

impl Shutdown {
    pub(crate) fn new(notify: broadcast::Receiver<()>) -> Shutdown {
        Shutdown {
            is_shutdown: false,
            notify,
        }
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.is_shutdown
    }

    /// Receives the shutdown notice, waiting if necessary.
    pub(crate) async fn recv(&mut self) {
        if self.is_shutdown {
            return;
        }

        // Cannot receive a "lag" error here as only one value is ever sent.
        let _ = self.notify.recv().await;
        self.is_shutdown = true;
    }
}
