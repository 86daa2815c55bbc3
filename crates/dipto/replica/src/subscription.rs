//! Cancellable feeds over spawned pump tasks
//!
//! Every replica subscription is a spawned task (the pump) that forwards
//! typed deliveries into an unbounded channel. The consumer holds a [`Feed`]
//! and may cancel it through its [`Subscription`] at any time. Once cancelled,
//! a feed yields nothing more, even if the pump had already queued items.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Handle that detaches a running subscription.
#[derive(Debug)]
pub struct Subscription {
    cancel: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Subscription {
    /// Stop the pump. Safe to call any number of times.
    pub fn unsubscribe(&self) {
        self.cancel.send_replace(true);
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Consumer side of a subscription.
#[derive(Debug)]
pub struct Feed<T> {
    rx: mpsc::UnboundedReceiver<T>,
    subscription: Subscription,
}

impl<T> Feed<T> {
    /// Next delivery, or `None` once the pump finished or the feed was cancelled.
    pub async fn next(&mut self) -> Option<T> {
        if self.subscription.is_cancelled() {
            return None;
        }
        let item = self.rx.recv().await?;
        if self.subscription.is_cancelled() {
            return None;
        }
        Some(item)
    }

    /// A delivery that is already queued, without waiting.
    pub fn try_next(&mut self) -> Option<T> {
        if self.subscription.is_cancelled() {
            return None;
        }
        self.rx.try_recv().ok()
    }

    pub fn unsubscribe(&mut self) {
        self.subscription.unsubscribe();
        self.rx.close();
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

/// Producer side handed to a pump.
#[derive(Debug, Clone)]
pub struct Publisher<T> {
    tx: mpsc::UnboundedSender<T>,
    cancel: watch::Receiver<bool>,
}

impl<T> Publisher<T> {
    /// Deliver one item. Returns false once the consumer is gone or cancelled,
    /// at which point the pump should return.
    pub fn publish(&self, item: T) -> bool {
        if self.is_cancelled() {
            return false;
        }
        self.tx.send(item).is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow() || self.tx.is_closed()
    }

    /// Resolves once the subscription is cancelled.
    pub async fn cancelled(&self) {
        let mut cancel = self.cancel.clone();
        // A dropped sender means the subscription handle is gone too.
        let _ = cancel.wait_for(|cancelled| *cancelled).await;
    }
}

/// Spawn `pump` on the current runtime and return its feed.
pub fn spawn_feed<T, F, Fut>(pump: F) -> Feed<T>
where
    T: Send + 'static,
    F: FnOnce(Publisher<T>) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let (cancel, cancel_rx) = watch::channel(false);
    let publisher = Publisher {
        tx,
        cancel: cancel_rx,
    };
    let task = tokio::spawn(pump(publisher));

    Feed {
        rx,
        subscription: Subscription {
            cancel,
            task: Mutex::new(Some(task)),
        },
    }
}
