//! DIPTO Types - Core records shared by the replication engine
//!
//! Everything the replicas move between the remote document store and the
//! render layer is defined here, together with the built-in defaults used to
//! seed an empty store and the strict decoding step applied to every remote
//! payload.
//!
//! ## Key Concepts
//!
//! - **Identity**: the signed-in subject, if any; privilege is derived from its label
//! - **SiteConfiguration**: the singleton site-wide settings document
//! - **CatalogItem**: one course in the catalog collection
//! - **ReplicaState**: the composed, process-wide view owned by the replica host

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod catalog;
pub mod error;
pub mod identity;
pub mod ids;
pub mod query;
pub mod site;
pub mod state;

pub use catalog::{seed_catalog, CatalogDraft, CatalogItem, CourseLevel, PublishStatus};
pub use error::{DecodeError, DraftError};
pub use identity::{Identity, PRIVILEGED_IDENTITY_LABEL};
pub use ids::{ItemId, SubjectId};
pub use query::CatalogStats;
pub use site::SiteConfiguration;
pub use state::{ConfigErrorKind, ReplicaState, ViewMode};
