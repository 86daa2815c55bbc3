use crate::error::{AuthResult, StoreResult};
use crate::path::DocumentPath;
use crate::snapshot::{CollectionSnapshot, DocumentSnapshot, Listener};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

/// One operation inside an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set { path: DocumentPath, data: Value },
    Delete { path: DocumentPath },
}

impl WriteOp {
    pub fn path(&self) -> &DocumentPath {
        match self {
            WriteOp::Set { path, .. } | WriteOp::Delete { path } => path,
        }
    }
}

/// Group of writes applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: DocumentPath, data: Value) -> Self {
        self.ops.push(WriteOp::Set { path, data });
        self
    }

    pub fn delete(mut self, path: DocumentPath) -> Self {
        self.ops.push(WriteOp::Delete { path });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Remote, multi-writer document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Attach a live listener to one document.
    ///
    /// The current snapshot is delivered first, then one snapshot per change.
    async fn listen_document(&self, path: &DocumentPath) -> Listener<DocumentSnapshot>;

    /// Attach a live listener to a whole collection.
    async fn listen_collection(&self, collection: &str) -> Listener<CollectionSnapshot>;

    /// Read one document once.
    async fn get_document(&self, path: &DocumentPath) -> StoreResult<Option<Value>>;

    async fn document_exists(&self, path: &DocumentPath) -> StoreResult<bool> {
        Ok(self.get_document(path).await?.is_some())
    }

    /// Create or fully replace a document.
    async fn set_document(&self, path: &DocumentPath, data: Value) -> StoreResult<()>;

    /// Remove a document. Deleting a missing document is not an error.
    async fn delete_document(&self, path: &DocumentPath) -> StoreResult<()>;

    /// Apply a batch atomically.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;
}

/// A signed-in account as the provider reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    pub subject_id: String,
    /// Stable label, the account's email address.
    pub label: String,
}

/// External identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Change stream of the current account. On failure the provider reports `None`.
    fn watch(&self) -> watch::Receiver<Option<ProviderUser>>;

    async fn sign_in(&self, label: &str, secret: &str) -> AuthResult<ProviderUser>;

    /// Create an account and sign it in.
    async fn register(&self, label: &str, secret: &str) -> AuthResult<ProviderUser>;

    async fn sign_out(&self) -> AuthResult<()>;
}
