//! Live query observation.
//!
//! A [`Subject`] holds the latest full snapshot of an entity collection and
//! fans it out to any number of independent subscribers. The engine publishes
//! a fresh snapshot after every mutating store call; dropping a
//! [`Subscription`] unsubscribes cleanly with no further delivery.

use tokio::sync::watch;

/// Push-updated holder of the latest snapshot of a collection.
pub struct Subject<T> {
    tx: watch::Sender<Vec<T>>,
}

impl<T: Clone> Subject<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self { tx }
    }

    /// Replace the stored snapshot and wake all subscribers.
    pub fn publish(&self, snapshot: Vec<T>) {
        self.tx.send_replace(snapshot);
    }

    /// Open a new independent subscription, primed with the current snapshot.
    pub fn subscribe(&self) -> Subscription<T> {
        Subscription { rx: self.tx.subscribe() }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscriber's handle on a [`Subject`]. Drop it to unsubscribe.
pub struct Subscription<T> {
    rx: watch::Receiver<Vec<T>>,
}

impl<T: Clone> Subscription<T> {
    /// The snapshot as of the latest emission.
    pub fn current(&self) -> Vec<T> {
        self.rx.borrow().clone()
    }

    /// Wait for the next emission. Returns `None` once the subject is gone.
    pub async fn next(&mut self) -> Option<Vec<T>> {
        match self.rx.changed().await {
            Ok(()) => Some(self.rx.borrow_and_update().clone()),
            Err(_) => None,
        }
    }
}
