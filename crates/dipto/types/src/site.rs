//! Site-wide configuration document

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The singleton configuration record.
///
/// Field names on the wire follow the stored document (`siteName`,
/// `heroImage`, ...). [`Default`] is the built-in configuration used both to
/// seed a missing document and as the degraded fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfiguration {
    #[serde(rename = "siteName")]
    pub display_name: String,
    pub hero_heading: String,
    pub hero_subheading: String,
    #[serde(rename = "heroImage")]
    pub hero_image_ref: String,
    pub payments_enabled: bool,
    pub maintenance_mode: bool,
    pub meta_title: String,
    pub meta_description: String,
}

impl Default for SiteConfiguration {
    fn default() -> Self {
        Self {
            display_name: "DIPTO".to_string(),
            hero_heading: "Investing in Knowledge and Your Future".to_string(),
            hero_subheading: "Our e-learning programs have been developed to be a vehicle of delivering multimedia learning solutions for your business.".to_string(),
            hero_image_ref: "https://images.unsplash.com/photo-1539571696357-5a69c17a67c6?auto=format&fit=crop&q=80&w=800".to_string(),
            payments_enabled: true,
            maintenance_mode: false,
            meta_title: "DIPTO | Investing in Knowledge".to_string(),
            meta_description: "Professional career courses and expert mentorship.".to_string(),
        }
    }
}

impl SiteConfiguration {
    /// Decode a remote document payload.
    pub fn decode(value: Value) -> Result<Self, DecodeError> {
        serde_json::from_value(value).map_err(|e| DecodeError::Malformed {
            record: "site configuration".to_string(),
            reason: e.to_string(),
        })
    }

    /// Encode for a full-document write.
    pub fn encode(&self) -> Result<Value, DecodeError> {
        serde_json::to_value(self).map_err(|e| DecodeError::Encode(e.to_string()))
    }
}
