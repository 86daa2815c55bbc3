//! # DIPTO Replicas
//!
//! Local, render-ready copies of remotely stored state.
//!
//! ## Overview
//!
//! Three replicas each wrap one remote channel and turn its raw snapshots into
//! typed deliveries:
//!
//! - [`IdentityWatcher`]: the signed-in identity, or none
//! - [`ConfigReplica`]: the singleton site configuration document
//! - [`CatalogReplica`]: the catalog collection
//!
//! [`ReplicaHost`] owns their subscriptions, composes every delivery into one
//! [`ReplicaState`](dipto_types::ReplicaState) and publishes it on a `watch`
//! channel. Mutations go through the host so it can echo them locally before
//! the remote snapshot confirms them.
//!
//! ## Example
//!
//! ```rust,no_run
//! use dipto_replica::ReplicaHost;
//! use dipto_store::memory::{InMemoryDocumentStore, InMemoryIdentityProvider};
//! use std::sync::Arc;
//!
//! # async fn example() -> dipto_replica::ReplicaResult<()> {
//! let host = ReplicaHost::new(
//!     Arc::new(InMemoryDocumentStore::new()),
//!     Arc::new(InMemoryIdentityProvider::new()),
//! );
//! let mut state = host.start()?;
//! state.changed().await.ok();
//! println!("{} catalog items", state.borrow().catalog.len());
//! host.stop().await;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod catalog;
pub mod config;
mod error;
pub mod host;
pub mod identity;
pub mod reconcile;
pub mod subscription;

pub use catalog::{CatalogReplica, CATALOG_COLLECTION};
pub use config::{settings_path, ConfigEvent, ConfigReplica, SETTINGS_COLLECTION, SETTINGS_DOCUMENT};
pub use error::{ReplicaError, ReplicaResult};
pub use host::{HostView, ReplicaHost, PERMISSION_BANNER};
pub use identity::IdentityWatcher;
pub use reconcile::Reconciled;
pub use subscription::{Feed, Subscription};
