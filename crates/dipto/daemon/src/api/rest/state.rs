//! Application state for API handlers

use crate::error::{ApiError, ApiResult};
use dipto_copywriter::DescriptionWriter;
use dipto_gate::is_privileged;
use dipto_replica::ReplicaHost;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Replica host owning the composed state
    pub host: Arc<ReplicaHost>,

    /// Description drafts; absent when no API key is configured
    pub writer: Option<Arc<dyn DescriptionWriter>>,

    /// Daemon version
    pub version: String,
}

impl AppState {
    pub fn new(host: Arc<ReplicaHost>, writer: Option<Arc<dyn DescriptionWriter>>) -> Self {
        Self {
            host,
            writer,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Reject unless the provider currently reports the privileged identity.
    ///
    /// Reads the provider rather than the published state, which can trail a
    /// sign-in by one driver turn.
    pub fn require_privileged(&self) -> ApiResult<()> {
        let identity = self.host.identity().current();
        if is_privileged(identity.as_ref()) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "sign in with the administrator account".to_string(),
            ))
        }
    }
}
