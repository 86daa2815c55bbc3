//! Strongly-typed identifiers
//!
//! Both identifiers are opaque strings chosen by an external party (the
//! identity provider or the catalog editor), wrapped for type safety.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque subject identifier issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subject:{}", self.0)
    }
}

/// Stable identifier of a catalog item, also its document key in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier for a freshly created item, derived from the creation time.
    pub fn generate(now: chrono::DateTime<chrono::Utc>) -> Self {
        Self(format!("course-{}", now.timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generated_item_id_uses_millis() {
        let now = chrono::Utc.timestamp_millis_opt(1_710_000_000_123).unwrap();
        assert_eq!(ItemId::generate(now).as_str(), "course-1710000000123");
    }

    #[test]
    fn test_subject_id_display() {
        let id = SubjectId::new("u-42");
        assert_eq!(format!("{}", id), "subject:u-42");
    }

    #[test]
    fn test_blank_item_id_is_empty() {
        assert!(ItemId::new("  ").is_empty());
        assert!(!ItemId::new("1").is_empty());
    }
}
