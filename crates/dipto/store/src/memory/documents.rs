use crate::error::{StoreError, StoreResult};
use crate::path::DocumentPath;
use crate::snapshot::{CollectionSnapshot, DocumentSnapshot, Listener, ListenerSink, StoredDocument};
use crate::traits::{DocumentStore, WriteBatch, WriteOp};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{RwLock, RwLockWriteGuard};
use tracing::debug;

/// Write attempts kept by the log; older records are dropped first.
pub const WRITE_LOG_CAPACITY: usize = 1024;

/// Kind of a logged write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Set,
    Delete,
}

/// One write attempt, recorded whether or not it was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    pub path: DocumentPath,
    pub kind: WriteKind,
    pub batched: bool,
    pub applied: bool,
}

/// In-memory document store with live listeners.
///
/// Collections keep documents in insertion order; replacing a document keeps
/// its position. Every applied write pushes a fresh snapshot to the matching
/// listeners while the store lock is held, so listeners observe writes in
/// commit order.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<StoredDocument>>,
    document_listeners: Vec<(DocumentPath, ListenerSink<DocumentSnapshot>)>,
    collection_listeners: Vec<(String, ListenerSink<CollectionSnapshot>)>,
    read_faults: HashMap<String, StoreError>,
    write_fault: Option<StoreError>,
    write_log: VecDeque<WriteRecord>,
}

impl Inner {
    fn document(&self, path: &DocumentPath) -> Option<Value> {
        self.collections
            .get(path.collection())
            .and_then(|docs| docs.iter().find(|doc| doc.id == path.id()))
            .map(|doc| doc.data.clone())
    }

    fn collection_snapshot(&self, collection: &str) -> CollectionSnapshot {
        CollectionSnapshot {
            collection: collection.to_string(),
            documents: self.collections.get(collection).cloned().unwrap_or_default(),
        }
    }

    fn write_error(&self, path: &DocumentPath) -> Option<StoreError> {
        if path.id().trim().is_empty() {
            return Some(StoreError::InvalidInput(format!(
                "empty document id in {}",
                path.collection()
            )));
        }
        if let Some(err) = &self.write_fault {
            return Some(err.clone());
        }
        match self.read_faults.get(path.collection()) {
            Some(err) if err.is_permission_denied() => Some(err.clone()),
            _ => None,
        }
    }

    fn apply(&mut self, op: WriteOp) {
        match op {
            WriteOp::Set { path, data } => {
                let docs = self.collections.entry(path.collection().to_string()).or_default();
                match docs.iter_mut().find(|doc| doc.id == path.id()) {
                    Some(doc) => doc.data = data,
                    None => docs.push(StoredDocument {
                        id: path.id().to_string(),
                        data,
                    }),
                }
            }
            WriteOp::Delete { path } => {
                if let Some(docs) = self.collections.get_mut(path.collection()) {
                    docs.retain(|doc| doc.id != path.id());
                }
            }
        }
    }

    fn notify(&mut self, touched: &[DocumentPath]) {
        let mut document_listeners = std::mem::take(&mut self.document_listeners);
        document_listeners.retain(|(path, sink)| {
            if !touched.contains(path) {
                return !sink.is_closed();
            }
            let snapshot = DocumentSnapshot {
                path: path.clone(),
                data: self.document(path),
            };
            sink.send(Ok(snapshot)).is_ok()
        });
        self.document_listeners = document_listeners;

        let collections: HashSet<String> = touched
            .iter()
            .map(|path| path.collection().to_string())
            .collect();
        let mut collection_listeners = std::mem::take(&mut self.collection_listeners);
        collection_listeners.retain(|(collection, sink)| {
            if !collections.contains(collection) {
                return !sink.is_closed();
            }
            sink.send(Ok(self.collection_snapshot(collection))).is_ok()
        });
        self.collection_listeners = collection_listeners;
    }

    /// Push `error` to every listener on `collection` and detach them.
    fn fail_listeners(&mut self, collection: &str, error: &StoreError) {
        self.document_listeners.retain(|(path, sink)| {
            if path.collection() == collection {
                let _ = sink.send(Err(error.clone()));
                false
            } else {
                true
            }
        });
        self.collection_listeners.retain(|(name, sink)| {
            if name == collection {
                let _ = sink.send(Err(error.clone()));
                false
            } else {
                true
            }
        });
    }

    fn log(&mut self, path: &DocumentPath, kind: WriteKind, batched: bool, applied: bool) {
        if self.write_log.len() == WRITE_LOG_CAPACITY {
            self.write_log.pop_front();
        }
        self.write_log.push_back(WriteRecord {
            path: path.clone(),
            kind,
            batched,
            applied,
        });
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("document store lock poisoned".to_string()))
    }

    /// Insert a document without logging a write, e.g. to stage remote state in a test.
    pub fn preload(&self, path: &DocumentPath, data: Value) -> StoreResult<()> {
        let mut inner = self.guard()?;
        inner.apply(WriteOp::Set {
            path: path.clone(),
            data,
        });
        inner.notify(std::slice::from_ref(path));
        Ok(())
    }

    /// Reject reads on `collection` with `PermissionDenied`. Writes are rejected too.
    pub fn deny_reads(&self, collection: &str) -> StoreResult<()> {
        self.set_read_fault(
            collection,
            StoreError::PermissionDenied(format!("missing or insufficient permissions on {}", collection)),
        )
    }

    /// Reject reads on `collection` with a transient `Unavailable` error.
    pub fn fail_reads(&self, collection: &str, reason: &str) -> StoreResult<()> {
        self.set_read_fault(collection, StoreError::Unavailable(reason.to_string()))
    }

    fn set_read_fault(&self, collection: &str, error: StoreError) -> StoreResult<()> {
        let mut inner = self.guard()?;
        inner.fail_listeners(collection, &error);
        inner.read_faults.insert(collection.to_string(), error);
        Ok(())
    }

    pub fn restore_reads(&self, collection: &str) -> StoreResult<()> {
        self.guard()?.read_faults.remove(collection);
        Ok(())
    }

    /// Fail every subsequent write with `error` until [`Self::restore_writes`].
    pub fn fail_writes(&self, error: StoreError) -> StoreResult<()> {
        self.guard()?.write_fault = Some(error);
        Ok(())
    }

    pub fn restore_writes(&self) -> StoreResult<()> {
        self.guard()?.write_fault = None;
        Ok(())
    }

    /// The most recent write attempts, oldest first, up to [`WRITE_LOG_CAPACITY`].
    pub fn write_log(&self) -> Vec<WriteRecord> {
        self.inner
            .read()
            .map(|inner| inner.write_log.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of write attempts against `path`, applied or not.
    pub fn write_attempts(&self, path: &DocumentPath) -> usize {
        self.write_log()
            .iter()
            .filter(|record| &record.path == path)
            .count()
    }

    /// Listeners whose receiving half is still alive.
    pub fn active_listeners(&self) -> usize {
        self.inner
            .read()
            .map(|inner| {
                inner
                    .document_listeners
                    .iter()
                    .filter(|(_, sink)| !sink.is_closed())
                    .count()
                    + inner
                        .collection_listeners
                        .iter()
                        .filter(|(_, sink)| !sink.is_closed())
                        .count()
            })
            .unwrap_or_default()
    }

    /// Document ids of `collection` in store order.
    pub fn document_ids(&self, collection: &str) -> Vec<String> {
        self.inner
            .read()
            .map(|inner| {
                inner
                    .collection_snapshot(collection)
                    .documents
                    .into_iter()
                    .map(|doc| doc.id)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn listen_document(&self, path: &DocumentPath) -> Listener<DocumentSnapshot> {
        let mut inner = match self.guard() {
            Ok(inner) => inner,
            Err(err) => return Listener::failed(err),
        };
        if let Some(err) = inner.read_faults.get(path.collection()) {
            return Listener::failed(err.clone());
        }

        let (sink, listener) = Listener::channel();
        let current = DocumentSnapshot {
            path: path.clone(),
            data: inner.document(path),
        };
        let _ = sink.send(Ok(current));
        inner.document_listeners.push((path.clone(), sink));
        debug!(path = %path, "Document listener attached");
        listener
    }

    async fn listen_collection(&self, collection: &str) -> Listener<CollectionSnapshot> {
        let mut inner = match self.guard() {
            Ok(inner) => inner,
            Err(err) => return Listener::failed(err),
        };
        if let Some(err) = inner.read_faults.get(collection) {
            return Listener::failed(err.clone());
        }

        let (sink, listener) = Listener::channel();
        let _ = sink.send(Ok(inner.collection_snapshot(collection)));
        inner
            .collection_listeners
            .push((collection.to_string(), sink));
        debug!(collection, "Collection listener attached");
        listener
    }

    async fn get_document(&self, path: &DocumentPath) -> StoreResult<Option<Value>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("document store lock poisoned".to_string()))?;
        if let Some(err) = inner.read_faults.get(path.collection()) {
            return Err(err.clone());
        }
        Ok(inner.document(path))
    }

    async fn set_document(&self, path: &DocumentPath, data: Value) -> StoreResult<()> {
        let mut inner = self.guard()?;
        let error = inner.write_error(path);
        inner.log(path, WriteKind::Set, false, error.is_none());
        if let Some(err) = error {
            return Err(err);
        }

        inner.apply(WriteOp::Set {
            path: path.clone(),
            data,
        });
        inner.notify(std::slice::from_ref(path));
        Ok(())
    }

    async fn delete_document(&self, path: &DocumentPath) -> StoreResult<()> {
        let mut inner = self.guard()?;
        let error = inner.write_error(path);
        inner.log(path, WriteKind::Delete, false, error.is_none());
        if let Some(err) = error {
            return Err(err);
        }

        inner.apply(WriteOp::Delete { path: path.clone() });
        inner.notify(std::slice::from_ref(path));
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut inner = self.guard()?;
        let error = batch.ops().iter().find_map(|op| inner.write_error(op.path()));
        for op in batch.ops() {
            let kind = match op {
                WriteOp::Set { .. } => WriteKind::Set,
                WriteOp::Delete { .. } => WriteKind::Delete,
            };
            inner.log(op.path(), kind, true, error.is_none());
        }
        if let Some(err) = error {
            return Err(err);
        }

        let touched: Vec<DocumentPath> = batch.ops().iter().map(|op| op.path().clone()).collect();
        for op in batch.into_ops() {
            inner.apply(op);
        }
        inner.notify(&touched);
        Ok(())
    }
}
