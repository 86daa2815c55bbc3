//! In-memory reference backends.
//!
//! Both backends are deterministic and test-friendly, and expose fault
//! injection hooks so degraded paths can be exercised without a network.
//! Production deployments point the replicas at a real remote store.

mod documents;
mod identity;

pub use documents::{InMemoryDocumentStore, WriteKind, WriteRecord, WRITE_LOG_CAPACITY};
pub use identity::{InMemoryIdentityProvider, MIN_SECRET_LEN};
