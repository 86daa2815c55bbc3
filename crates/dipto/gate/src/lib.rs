//! # DIPTO Access Gate
//!
//! Pure decisions over `{identity, maintenance flag, initializing}`.
//!
//! The gate never performs I/O and holds no state except for the
//! [`PrivilegedRouteGuard`], which remembers how a mounted privileged route
//! resolved. Callers re-evaluate whenever identity or configuration changes.
//!
//! ## Key Components
//!
//! - [`is_privileged`], [`active_view_mode`]: privilege derivation
//! - [`maintenance_blocks_access`]: maintenance bypass for the privileged identity
//! - [`can_enter_privileged_route`]: loading-aware entry check
//! - [`Route`], [`RouteDecision`], [`decide`]: per-route composition of the rules
//! - [`PrivilegedRouteGuard`]: one-shot resolution of a privileged route mount

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod access;
pub mod guard;
pub mod route;

pub use access::{
    active_view_mode, can_enter_privileged_route, is_privileged, maintenance_blocks_access,
    EntryDecision,
};
pub use guard::{GuardState, PrivilegedRouteGuard};
pub use route::{decide, GateInputs, Route, RouteDecision, IDENTITY_ENTRY_PATH, PRIVILEGED_PATH};
