//! Signed-in identity

use crate::ids::SubjectId;
use serde::{Deserialize, Serialize};

/// The one label granted administrative access.
pub const PRIVILEGED_IDENTITY_LABEL: &str = "diptoislam2006@gmail.com";

/// A signed-in subject as reported by the identity provider.
///
/// Privilege is never stored: [`Identity::is_privileged`] compares the label
/// against [`PRIVILEGED_IDENTITY_LABEL`] every time it is asked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    subject_id: SubjectId,
    display_label: String,
}

impl Identity {
    pub fn new(subject_id: SubjectId, display_label: impl Into<String>) -> Self {
        Self {
            subject_id,
            display_label: display_label.into(),
        }
    }

    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    pub fn display_label(&self) -> &str {
        &self.display_label
    }

    /// Exact, case-sensitive match against the privileged label.
    pub fn is_privileged(&self) -> bool {
        self.display_label == PRIVILEGED_IDENTITY_LABEL
    }
}
