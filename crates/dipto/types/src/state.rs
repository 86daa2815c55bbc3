//! Composed replica state

use crate::catalog::CatalogItem;
use crate::identity::Identity;
use crate::site::SiteConfiguration;
use serde::{Deserialize, Serialize};

/// Why the configuration channel is degraded, if it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigErrorKind {
    #[default]
    None,
    /// The store refused access; defaults are shown and an operator banner is raised.
    PermissionDenied,
    /// Any other transport failure; defaults are shown silently.
    Unknown,
}

/// Which face of the application is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewMode {
    #[default]
    Public,
    Privileged,
}

/// Process-wide, render-ready view of the replicated state.
///
/// Only the replica host writes this; everyone else holds a cloned snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplicaState {
    pub identity: Option<Identity>,
    pub maintenance_flag: bool,
    pub config_error: ConfigErrorKind,
    pub configuration: SiteConfiguration,
    /// Items in snapshot arrival order.
    pub catalog: Vec<CatalogItem>,
    /// True until the identity watcher has delivered its first notification.
    pub initializing: bool,
}

impl Default for ReplicaState {
    fn default() -> Self {
        let configuration = SiteConfiguration::default();
        Self {
            identity: None,
            maintenance_flag: configuration.maintenance_mode,
            config_error: ConfigErrorKind::None,
            configuration,
            catalog: Vec::new(),
            initializing: true,
        }
    }
}

impl ReplicaState {
    /// Replace the configuration, keeping the maintenance flag in step.
    pub fn set_configuration(&mut self, configuration: SiteConfiguration) {
        self.maintenance_flag = configuration.maintenance_mode;
        self.configuration = configuration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_initializing() {
        let state = ReplicaState::default();
        assert!(state.initializing);
        assert!(state.identity.is_none());
        assert!(state.catalog.is_empty());
        assert_eq!(state.config_error, ConfigErrorKind::None);
    }

    #[test]
    fn test_configuration_drives_maintenance_flag() {
        let mut state = ReplicaState::default();
        let config = SiteConfiguration {
            maintenance_mode: true,
            ..SiteConfiguration::default()
        };
        state.set_configuration(config);
        assert!(state.maintenance_flag);
    }
}
