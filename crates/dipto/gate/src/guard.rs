//! One-shot resolution of a mounted privileged route

use crate::access::{can_enter_privileged_route, EntryDecision};
use dipto_types::Identity;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GuardState {
    #[default]
    Initializing,
    Granted,
    Redirected,
}

impl GuardState {
    pub fn is_resolved(self) -> bool {
        !matches!(self, GuardState::Initializing)
    }
}

/// `Initializing -> Granted | Redirected`.
///
/// Once resolved the guard ignores further inputs. Mounting the route again
/// means building a new guard.
#[derive(Debug, Default)]
pub struct PrivilegedRouteGuard {
    state: GuardState,
}

impl PrivilegedRouteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Feed the latest identity and return the (possibly unchanged) state.
    pub fn observe(&mut self, identity: Option<&Identity>, initializing: bool) -> GuardState {
        if self.state.is_resolved() {
            return self.state;
        }

        self.state = match can_enter_privileged_route(identity, initializing) {
            EntryDecision::Pending => GuardState::Initializing,
            EntryDecision::Allow => GuardState::Granted,
            EntryDecision::Deny => GuardState::Redirected,
        };
        if self.state.is_resolved() {
            debug!(state = ?self.state, "Privileged route resolved");
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dipto_types::{SubjectId, PRIVILEGED_IDENTITY_LABEL};

    #[test]
    fn test_stays_initializing_until_identity_known() {
        let mut guard = PrivilegedRouteGuard::new();
        assert_eq!(guard.observe(None, true), GuardState::Initializing);
        assert_eq!(guard.observe(None, true), GuardState::Initializing);
        assert!(!guard.state().is_resolved());
    }

    #[test]
    fn test_granted_is_terminal() {
        let admin = Identity::new(SubjectId::new("s-1"), PRIVILEGED_IDENTITY_LABEL);
        let mut guard = PrivilegedRouteGuard::new();
        assert_eq!(guard.observe(Some(&admin), false), GuardState::Granted);
        // sign-out after resolution does not flip a mounted guard
        assert_eq!(guard.observe(None, false), GuardState::Granted);
    }

    #[test]
    fn test_redirected_is_terminal() {
        let admin = Identity::new(SubjectId::new("s-1"), PRIVILEGED_IDENTITY_LABEL);
        let mut guard = PrivilegedRouteGuard::new();
        assert_eq!(guard.observe(None, false), GuardState::Redirected);
        assert_eq!(guard.observe(Some(&admin), false), GuardState::Redirected);

        let mut remounted = PrivilegedRouteGuard::new();
        assert_eq!(remounted.observe(Some(&admin), false), GuardState::Granted);
    }
}
