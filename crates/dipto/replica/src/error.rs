//! Error types for the replicas

use dipto_store::{AuthError, StoreError};
use dipto_types::{DecodeError, DraftError, ItemId};
use thiserror::Error;

pub type ReplicaResult<T> = Result<T, ReplicaError>;

/// Errors returned to callers of replica operations.
///
/// Listener failures never show up here; they are absorbed by the replica
/// that owns the listener. Only mutations report failure to their caller.
#[derive(Debug, Error)]
pub enum ReplicaError {
    /// A remote write was rejected. Any optimistic local value is kept.
    #[error("write to {target} failed, the change may only exist locally: {source}")]
    WriteFailed {
        target: String,
        #[source]
        source: StoreError,
    },

    #[error("catalog item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("record could not be encoded or decoded: {0}")]
    Decode(#[from] DecodeError),

    #[error("draft rejected: {0}")]
    Draft(#[from] DraftError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("replica host is already running")]
    AlreadyRunning,
}

impl ReplicaError {
    pub(crate) fn write_failed(target: impl ToString, source: StoreError) -> Self {
        Self::WriteFailed {
            target: target.to_string(),
            source,
        }
    }

    pub fn is_write_failure(&self) -> bool {
        matches!(self, ReplicaError::WriteFailed { .. })
    }
}
