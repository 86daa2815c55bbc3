//! Catalog handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use dipto_types::query::{self, CatalogStats};
use dipto_types::{CatalogDraft, CatalogItem, ItemId, PublishStatus};
use serde::Deserialize;

/// Catalog listing filters
#[derive(Debug, Default, Deserialize)]
pub struct ListCoursesQuery {
    /// Case-insensitive match on title or category
    pub q: Option<String>,
    pub category: Option<String>,
    /// Only published items
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: PublishStatus,
}

fn current_item(state: &AppState, id: &str) -> ApiResult<CatalogItem> {
    let catalog = state.host.state().catalog;
    query::find(&catalog, id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("Course {} not found", id)))
}

pub async fn list_courses(
    State(state): State<AppState>,
    Query(filter): Query<ListCoursesQuery>,
) -> Json<Vec<CatalogItem>> {
    let catalog = state.host.state().catalog;
    let items = query::search(&catalog, filter.q.as_deref().unwrap_or_default())
        .into_iter()
        .filter(|item| {
            filter
                .category
                .as_deref()
                .map_or(true, |category| item.category == category)
        })
        .filter(|item| !filter.published || item.is_published())
        .cloned()
        .collect();
    Json(items)
}

pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CatalogItem>> {
    Ok(Json(current_item(&state, &id)?))
}

/// Create a course from an editor draft.
pub async fn create_course(
    State(state): State<AppState>,
    Json(draft): Json<CatalogDraft>,
) -> ApiResult<(StatusCode, Json<CatalogItem>)> {
    state.require_privileged()?;
    let item = state.host.save_draft(draft, None).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Replace a course from an editor draft; id and enrolment are kept.
pub async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<CatalogDraft>,
) -> ApiResult<Json<CatalogItem>> {
    state.require_privileged()?;
    let existing = current_item(&state, &id)?;
    let item = state.host.save_draft(draft, Some(&existing)).await?;
    Ok(Json(item))
}

pub async fn set_course_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Json<CatalogItem>> {
    state.require_privileged()?;
    let item = state
        .host
        .set_item_status(&ItemId::new(id), request.status)
        .await?;
    Ok(Json(item))
}

pub async fn toggle_course_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CatalogItem>> {
    state.require_privileged()?;
    let existing = current_item(&state, &id)?;
    let item = state.host.toggle_item_status(&existing).await?;
    Ok(Json(item))
}

pub async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.require_privileged()?;
    state.host.delete_item(&ItemId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn catalog_stats(State(state): State<AppState>) -> Json<CatalogStats> {
    Json(state.host.view().stats)
}
