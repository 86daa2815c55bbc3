//! Snapshot payloads and the live listener stream.

use crate::error::StoreResult;
use crate::path::DocumentPath;
use serde_json::Value;
use tokio::sync::mpsc;

/// Full current state of one document. `data` is `None` if it does not exist.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub path: DocumentPath,
    pub data: Option<Value>,
}

impl DocumentSnapshot {
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }
}

/// One document inside a collection snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Value,
}

/// Full current state of a collection, in store order.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSnapshot {
    pub collection: String,
    pub documents: Vec<StoredDocument>,
}

impl CollectionSnapshot {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }
}

/// Producer half of a listener, held by the store.
pub type ListenerSink<T> = mpsc::UnboundedSender<StoreResult<T>>;

/// Live stream of snapshots for one address.
///
/// Dropping the listener detaches it from the store. A transport failure is
/// delivered as an `Err` item, after which the stream ends.
#[derive(Debug)]
pub struct Listener<T> {
    rx: mpsc::UnboundedReceiver<StoreResult<T>>,
}

impl<T> Listener<T> {
    /// Create a connected sink/listener pair.
    pub fn channel() -> (ListenerSink<T>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// A listener that yields one error and closes.
    pub fn failed(error: crate::StoreError) -> Self {
        let (tx, listener) = Self::channel();
        let _ = tx.send(Err(error));
        listener
    }

    /// Next snapshot, or `None` once the store closed the stream.
    pub async fn next(&mut self) -> Option<StoreResult<T>> {
        self.rx.recv().await
    }
}
