//! Read-only views over a replicated catalog.
//!
//! All helpers preserve the arrival order of the slice they are given.

use crate::catalog::CatalogItem;
use rust_decimal::Decimal;
use serde::Serialize;

/// Case-insensitive match on title or category.
pub fn search<'a>(items: &'a [CatalogItem], term: &str) -> Vec<&'a CatalogItem> {
    let needle = term.trim().to_lowercase();
    items
        .iter()
        .filter(|item| {
            needle.is_empty()
                || item.title.to_lowercase().contains(&needle)
                || item.category.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Distinct categories in first-seen order.
pub fn categories(items: &[CatalogItem]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for item in items {
        if !seen.contains(&item.category.as_str()) {
            seen.push(&item.category);
        }
    }
    seen
}

pub fn in_category<'a>(items: &'a [CatalogItem], category: &str) -> Vec<&'a CatalogItem> {
    items.iter().filter(|item| item.category == category).collect()
}

pub fn find<'a>(items: &'a [CatalogItem], id: &str) -> Option<&'a CatalogItem> {
    items.iter().find(|item| item.id.as_str() == id)
}

pub fn published(items: &[CatalogItem]) -> Vec<&CatalogItem> {
    items.iter().filter(|item| item.is_published()).collect()
}

/// Dashboard aggregates. Sums saturate instead of overflowing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CatalogStats {
    /// Sum of list price times enrolled students.
    pub total_revenue: Decimal,
    pub total_students: u64,
    pub active_courses: usize,
}

impl CatalogStats {
    pub fn compute(items: &[CatalogItem]) -> Self {
        items.iter().fold(Self::default(), |mut stats, item| {
            let revenue = item.price.saturating_mul(Decimal::from(item.student_count));
            stats.total_revenue = stats.total_revenue.saturating_add(revenue);
            stats.total_students = stats.total_students.saturating_add(item.student_count);
            if item.is_published() {
                stats.active_courses += 1;
            }
            stats
        })
    }
}
