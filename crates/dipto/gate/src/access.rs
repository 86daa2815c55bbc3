//! Privilege and maintenance rules

use dipto_types::{Identity, ViewMode};
use serde::{Deserialize, Serialize};

/// True iff an identity is present and its label is the privileged one.
pub fn is_privileged(identity: Option<&Identity>) -> bool {
    identity.is_some_and(Identity::is_privileged)
}

pub fn active_view_mode(identity: Option<&Identity>) -> ViewMode {
    if is_privileged(identity) {
        ViewMode::Privileged
    } else {
        ViewMode::Public
    }
}

/// Maintenance hides the site from everyone except the privileged identity.
pub fn maintenance_blocks_access(maintenance_flag: bool, identity: Option<&Identity>) -> bool {
    maintenance_flag && !is_privileged(identity)
}

/// Outcome of an attempt to enter a privileged route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryDecision {
    /// Identity is not known yet; show a placeholder.
    Pending,
    Allow,
    /// Send the caller to the identity-entry route.
    Deny,
}

impl EntryDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, EntryDecision::Allow)
    }
}

/// Never denies while the first identity notification is outstanding.
pub fn can_enter_privileged_route(identity: Option<&Identity>, initializing: bool) -> EntryDecision {
    if initializing {
        EntryDecision::Pending
    } else if is_privileged(identity) {
        EntryDecision::Allow
    } else {
        EntryDecision::Deny
    }
}
