//! Catalog records
//!
//! A [`CatalogItem`] is stored as one document per item, keyed by its id.
//! Records are always written whole; a status change is a read-modify-write
//! of the full record through [`CatalogItem::with_status`].

use crate::error::{DecodeError, DraftError};
use crate::ids::ItemId;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Instructor recorded on items saved from the catalog editor.
pub const EDITOR_INSTRUCTOR_LABEL: &str = "Dipto Islam";

/// Difficulty level of a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CourseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// Visibility of a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PublishStatus {
    #[default]
    Published,
    Draft,
}

impl PublishStatus {
    /// Published becomes Draft and vice versa.
    pub fn toggled(self) -> Self {
        match self {
            PublishStatus::Published => PublishStatus::Draft,
            PublishStatus::Draft => PublishStatus::Published,
        }
    }
}

/// One course in the catalog collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: ItemId,
    pub title: String,
    #[serde(rename = "instructor")]
    pub instructor_label: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<Decimal>,
    pub rating: Decimal,
    #[serde(rename = "students")]
    pub student_count: u64,
    #[serde(rename = "image")]
    pub image_ref: String,
    pub category: String,
    pub description: String,
    pub level: CourseLevel,
    pub status: PublishStatus,
    pub updated_at: NaiveDate,
}

impl CatalogItem {
    /// Decode the document stored under `key`.
    ///
    /// Fails on schema mismatch, on an embedded id that differs from the key,
    /// and on out-of-range values.
    pub fn decode(key: &str, value: Value) -> Result<Self, DecodeError> {
        let item: CatalogItem =
            serde_json::from_value(value).map_err(|e| DecodeError::Malformed {
                record: key.to_string(),
                reason: e.to_string(),
            })?;

        if item.id.as_str() != key {
            return Err(DecodeError::KeyMismatch {
                key: key.to_string(),
                id: item.id.to_string(),
            });
        }

        item.validate()?;
        Ok(item)
    }

    /// Encode for a full-document write.
    pub fn encode(&self) -> Result<Value, DecodeError> {
        self.validate()?;
        serde_json::to_value(self).map_err(|e| DecodeError::Encode(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), DecodeError> {
        let invalid = |field: &'static str, reason: &str| DecodeError::InvalidField {
            record: self.id.to_string(),
            field,
            reason: reason.to_string(),
        };

        if self.id.is_empty() {
            return Err(invalid("id", "must not be empty"));
        }
        if self.price < Decimal::ZERO {
            return Err(invalid("price", "must not be negative"));
        }
        if let Some(discount) = self.discount_price {
            if discount < Decimal::ZERO {
                return Err(invalid("discountPrice", "must not be negative"));
            }
        }
        if self.rating < Decimal::ZERO || self.rating > Decimal::from(5) {
            return Err(invalid("rating", "must be within 0..=5"));
        }
        Ok(())
    }

    /// Copy of this record with only the status replaced.
    pub fn with_status(&self, status: PublishStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == PublishStatus::Published
    }
}

/// Built-in catalog written to an empty collection on first observation.
pub fn seed_catalog() -> Vec<CatalogItem> {
    vec![
        CatalogItem {
            id: ItemId::new("1"),
            title: "UI/UX Design Masterclass 2024".to_string(),
            instructor_label: "Alex Rivera".to_string(),
            price: Decimal::new(4999, 2),
            discount_price: Some(Decimal::new(3999, 2)),
            rating: Decimal::new(48, 1),
            student_count: 1250,
            image_ref: "https://images.unsplash.com/photo-1586717791821-3f44a563eb4c?auto=format&fit=crop&q=80&w=400".to_string(),
            category: "Design".to_string(),
            description: "Master the art of user interface and experience design from scratch.".to_string(),
            level: CourseLevel::Beginner,
            status: PublishStatus::Published,
            updated_at: seed_date(2024, 3, 15),
        },
        CatalogItem {
            id: ItemId::new("2"),
            title: "Advanced React & TypeScript Patterns".to_string(),
            instructor_label: "Sarah Chen".to_string(),
            price: Decimal::new(8999, 2),
            discount_price: None,
            rating: Decimal::new(49, 1),
            student_count: 840,
            image_ref: "https://images.unsplash.com/photo-1633356122544-f134324a6cee?auto=format&fit=crop&q=80&w=400".to_string(),
            category: "Development".to_string(),
            description: "Deep dive into advanced React concepts and TypeScript integration.".to_string(),
            level: CourseLevel::Advanced,
            status: PublishStatus::Published,
            updated_at: seed_date(2024, 3, 10),
        },
    ]
}

fn seed_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// Editable subset of a catalog item, as filled in by an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDraft {
    pub title: String,
    pub category: String,
    pub price: Decimal,
    pub description: String,
    pub image_ref: String,
    pub level: CourseLevel,
    pub status: PublishStatus,
}

impl Default for CatalogDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            category: "Development".to_string(),
            price: Decimal::new(4999, 2),
            description: String::new(),
            image_ref: String::new(),
            level: CourseLevel::Beginner,
            status: PublishStatus::Published,
        }
    }
}

impl CatalogDraft {
    /// Start editing an existing item.
    pub fn from_item(item: &CatalogItem) -> Self {
        Self {
            title: item.title.clone(),
            category: item.category.clone(),
            price: item.price,
            description: item.description.clone(),
            image_ref: item.image_ref.clone(),
            level: item.level,
            status: item.status,
        }
    }

    /// Build the full record to write.
    ///
    /// When `existing` is given the item keeps its id and student count;
    /// otherwise a new id is derived from `now`.
    pub fn into_item(
        self,
        existing: Option<&CatalogItem>,
        now: DateTime<Utc>,
    ) -> Result<CatalogItem, DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::Incomplete("title"));
        }
        if self.description.trim().is_empty() {
            return Err(DraftError::Incomplete("description"));
        }
        if self.image_ref.trim().is_empty() {
            return Err(DraftError::Incomplete("image"));
        }
        if self.price < Decimal::ZERO {
            return Err(DraftError::NegativePrice);
        }

        let (id, student_count) = match existing {
            Some(item) => (item.id.clone(), item.student_count),
            None => (ItemId::generate(now), 0),
        };

        Ok(CatalogItem {
            id,
            title: self.title,
            instructor_label: EDITOR_INSTRUCTOR_LABEL.to_string(),
            price: self.price,
            discount_price: None,
            rating: Decimal::new(45, 1),
            student_count,
            image_ref: self.image_ref,
            category: self.category,
            description: self.description,
            level: self.level,
            status: self.status,
            updated_at: now.date_naive(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> CatalogItem {
        seed_catalog().remove(0)
    }

    #[test]
    fn test_seed_catalog_ids() {
        let seed = seed_catalog();
        let ids: Vec<_> = seed.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(seed.iter().all(|i| i.validate().is_ok()));
    }

    #[test]
    fn test_wire_format_matches_stored_documents() {
        let value = sample().encode().unwrap();
        assert_eq!(value["instructor"], "Alex Rivera");
        assert_eq!(value["students"], 1250);
        assert_eq!(value["price"], json!(49.99));
        assert_eq!(value["discountPrice"], json!(39.99));
        assert_eq!(value["updatedAt"], "2024-03-15");
        assert_eq!(value["level"], "Beginner");

        let second = seed_catalog().remove(1).encode().unwrap();
        assert!(second.get("discountPrice").is_none());
    }

    #[test]
    fn test_decode_stored_document() {
        let value = json!({
            "id": "7",
            "title": "Rust",
            "instructor": "Ferris",
            "price": 10,
            "rating": 4.5,
            "students": 3,
            "image": "img",
            "category": "Development",
            "description": "d",
            "level": "Intermediate",
            "status": "Draft",
            "updatedAt": "2024-05-01"
        });
        let item = CatalogItem::decode("7", value).unwrap();
        assert_eq!(item.price, Decimal::from(10));
        assert_eq!(item.rating, Decimal::new(45, 1));
        assert_eq!(item.level, CourseLevel::Intermediate);
        assert_eq!(item.status, PublishStatus::Draft);
        assert_eq!(item.discount_price, None);
    }

    #[test]
    fn test_decode_rejects_key_mismatch() {
        let value = sample().encode().unwrap();
        let err = CatalogItem::decode("99", value).unwrap_err();
        assert!(matches!(err, DecodeError::KeyMismatch { .. }));
    }

    #[test]
    fn test_decode_rejects_out_of_range_rating() {
        let mut value = sample().encode().unwrap();
        value["rating"] = json!(5.5);
        let err = CatalogItem::decode("1", value).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: "rating", .. }));
    }

    #[test]
    fn test_decode_rejects_negative_students_and_unknown_level() {
        let mut value = sample().encode().unwrap();
        value["students"] = json!(-1);
        assert!(CatalogItem::decode("1", value).is_err());

        let mut value = sample().encode().unwrap();
        value["level"] = json!("Expert");
        assert!(CatalogItem::decode("1", value).is_err());

        let mut value = sample().encode().unwrap();
        value["updatedAt"] = json!("yesterday");
        assert!(CatalogItem::decode("1", value).is_err());
    }

    #[test]
    fn test_with_status_changes_only_status() {
        let item = sample();
        let drafted = item.with_status(PublishStatus::Draft);
        assert_eq!(drafted.status, PublishStatus::Draft);
        assert_eq!(drafted.with_status(PublishStatus::Published), item);
    }

    #[test]
    fn test_status_toggle() {
        assert_eq!(PublishStatus::Published.toggled(), PublishStatus::Draft);
        assert_eq!(PublishStatus::Draft.toggled(), PublishStatus::Published);
    }

    #[test]
    fn test_new_draft_becomes_item() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let draft = CatalogDraft {
            title: "Go Basics".to_string(),
            description: "Learn Go".to_string(),
            image_ref: "img".to_string(),
            ..CatalogDraft::default()
        };

        let item = draft.into_item(None, now).unwrap();
        assert_eq!(item.id, ItemId::generate(now));
        assert_eq!(item.instructor_label, EDITOR_INSTRUCTOR_LABEL);
        assert_eq!(item.rating, Decimal::new(45, 1));
        assert_eq!(item.student_count, 0);
        assert_eq!(item.category, "Development");
        assert_eq!(item.updated_at, now.date_naive());
    }

    #[test]
    fn test_edit_draft_keeps_id_and_students() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let existing = sample();
        let mut draft = CatalogDraft::from_item(&existing);
        draft.title = "Renamed".to_string();

        let item = draft.into_item(Some(&existing), now).unwrap();
        assert_eq!(item.id, existing.id);
        assert_eq!(item.student_count, existing.student_count);
        assert_eq!(item.title, "Renamed");
    }

    #[test]
    fn test_incomplete_draft_is_rejected() {
        let now = Utc::now();
        let draft = CatalogDraft {
            title: "T".to_string(),
            description: "D".to_string(),
            ..CatalogDraft::default()
        };
        assert_eq!(
            draft.into_item(None, now).unwrap_err(),
            DraftError::Incomplete("image")
        );
        assert_eq!(
            CatalogDraft::default().into_item(None, now).unwrap_err(),
            DraftError::Incomplete("title")
        );
    }
}
