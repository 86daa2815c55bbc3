//! Route classification and per-route decisions

use crate::access::{can_enter_privileged_route, maintenance_blocks_access, EntryDecision};
use dipto_types::{Identity, ReplicaState};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Path of the identity-entry route. It stays reachable during maintenance.
pub const IDENTITY_ENTRY_PATH: &str = "/auth";

/// Root of the privileged route tree.
pub const PRIVILEGED_PATH: &str = "/admin";

/// What kind of page a path addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    IdentityEntry,
    /// `/admin` and everything below it.
    Privileged(String),
    Public(String),
}

impl Route {
    pub fn classify(path: &str) -> Self {
        let trimmed = path.trim();
        let normalized = if trimmed.len() > 1 {
            trimmed.trim_end_matches('/')
        } else {
            trimmed
        };

        if normalized == IDENTITY_ENTRY_PATH {
            Route::IdentityEntry
        } else if normalized == PRIVILEGED_PATH
            || normalized
                .strip_prefix(PRIVILEGED_PATH)
                .is_some_and(|rest| rest.starts_with('/'))
        {
            Route::Privileged(normalized.to_string())
        } else {
            Route::Public(normalized.to_string())
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Route::IdentityEntry => IDENTITY_ENTRY_PATH,
            Route::Privileged(path) | Route::Public(path) => path,
        }
    }

    pub fn is_privileged(&self) -> bool {
        matches!(self, Route::Privileged(_))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Everything the gate reads.
#[derive(Debug, Clone, Copy)]
pub struct GateInputs<'a> {
    pub identity: Option<&'a Identity>,
    pub maintenance_flag: bool,
    pub initializing: bool,
}

impl<'a> GateInputs<'a> {
    pub fn from_state(state: &'a ReplicaState) -> Self {
        Self {
            identity: state.identity.as_ref(),
            maintenance_flag: state.maintenance_flag,
            initializing: state.initializing,
        }
    }
}

/// What the render layer should show for a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteDecision {
    Render,
    MaintenanceNotice,
    /// Identity not resolved yet.
    Loading,
    Redirect(String),
}

impl RouteDecision {
    pub fn redirect(target: impl Into<String>) -> Self {
        Self::Redirect(target.into())
    }
}

/// The identity-entry route always renders. Every other route waits for the
/// first identity notification before maintenance or privilege is judged.
pub fn decide(route: &Route, inputs: GateInputs<'_>) -> RouteDecision {
    if matches!(route, Route::IdentityEntry) {
        return RouteDecision::Render;
    }
    if inputs.initializing {
        return RouteDecision::Loading;
    }
    if maintenance_blocks_access(inputs.maintenance_flag, inputs.identity) {
        return RouteDecision::MaintenanceNotice;
    }

    match route {
        Route::Privileged(_) => match can_enter_privileged_route(inputs.identity, inputs.initializing)
        {
            EntryDecision::Pending => RouteDecision::Loading,
            EntryDecision::Allow => RouteDecision::Render,
            EntryDecision::Deny => RouteDecision::redirect(IDENTITY_ENTRY_PATH),
        },
        Route::IdentityEntry | Route::Public(_) => RouteDecision::Render,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dipto_types::{SubjectId, PRIVILEGED_IDENTITY_LABEL};

    fn inputs(identity: Option<&Identity>, maintenance_flag: bool, initializing: bool) -> GateInputs<'_> {
        GateInputs {
            identity,
            maintenance_flag,
            initializing,
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(Route::classify("/auth"), Route::IdentityEntry);
        assert_eq!(Route::classify("/auth/"), Route::IdentityEntry);
        assert_eq!(Route::classify("/admin"), Route::Privileged("/admin".into()));
        assert_eq!(
            Route::classify("/admin/courses"),
            Route::Privileged("/admin/courses".into())
        );
        assert_eq!(Route::classify("/administrator"), Route::Public("/administrator".into()));
        assert_eq!(Route::classify("/"), Route::Public("/".into()));
        assert_eq!(Route::classify("/course/1"), Route::Public("/course/1".into()));
    }

    #[test]
    fn test_maintenance_blocks_everything_but_identity_entry() {
        let home = Route::classify("/");
        let admin = Route::classify("/admin");
        assert_eq!(decide(&home, inputs(None, true, false)), RouteDecision::MaintenanceNotice);
        assert_eq!(decide(&admin, inputs(None, true, false)), RouteDecision::MaintenanceNotice);
        assert_eq!(
            decide(&Route::IdentityEntry, inputs(None, true, false)),
            RouteDecision::Render
        );
    }

    #[test]
    fn test_privileged_identity_bypasses_maintenance() {
        let admin_identity = Identity::new(SubjectId::new("s-1"), PRIVILEGED_IDENTITY_LABEL);
        let home = Route::classify("/");
        let admin = Route::classify("/admin/settings");
        assert_eq!(decide(&home, inputs(Some(&admin_identity), true, false)), RouteDecision::Render);
        assert_eq!(decide(&admin, inputs(Some(&admin_identity), true, false)), RouteDecision::Render);
    }

    #[test]
    fn test_privileged_route_waits_then_redirects() {
        let admin = Route::classify("/admin");
        assert_eq!(decide(&admin, inputs(None, false, true)), RouteDecision::Loading);
        assert_eq!(
            decide(&admin, inputs(None, false, false)),
            RouteDecision::redirect(IDENTITY_ENTRY_PATH)
        );

        let visitor = Identity::new(SubjectId::new("s-2"), "visitor@example.com");
        assert_eq!(
            decide(&admin, inputs(Some(&visitor), false, false)),
            RouteDecision::Redirect("/auth".into())
        );
    }

    #[test]
    fn test_inputs_from_state() {
        let state = ReplicaState::default();
        let gate = GateInputs::from_state(&state);
        assert!(gate.initializing);
        assert!(gate.identity.is_none());
        assert_eq!(decide(&Route::classify("/admin"), gate), RouteDecision::Loading);
    }

    #[test]
    fn test_loading_comes_before_maintenance() {
        let state = ReplicaState {
            maintenance_flag: true,
            ..ReplicaState::default()
        };
        let gate = GateInputs::from_state(&state);

        assert_eq!(decide(&Route::classify("/admin"), gate), RouteDecision::Loading);
        assert_eq!(decide(&Route::classify("/"), gate), RouteDecision::Loading);
        assert_eq!(decide(&Route::IdentityEntry, gate), RouteDecision::Render);
    }
}
