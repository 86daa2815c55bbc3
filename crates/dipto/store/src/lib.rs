//! DIPTO store contracts.
//!
//! This crate defines the two external channels the replication engine
//! consumes:
//! - a remote document store addressed by collection and document id, with
//!   live listeners, full-document writes, deletes and atomic batches
//! - an identity provider with sign-in/sign-out and a change stream
//!
//! Design stance:
//! - listeners deliver transport failures in-band, as the failing item of
//!   the stream, and close afterwards
//! - no query or filter capability is assumed of the store
//!
//! In-memory backends with fault injection live in [`memory`].

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod error;
pub mod memory;
mod path;
mod snapshot;
mod traits;

pub use error::{AuthError, AuthResult, StoreError, StoreResult};
pub use path::DocumentPath;
pub use snapshot::{CollectionSnapshot, DocumentSnapshot, Listener, ListenerSink, StoredDocument};
pub use traits::{DocumentStore, IdentityProvider, ProviderUser, WriteBatch, WriteOp};
