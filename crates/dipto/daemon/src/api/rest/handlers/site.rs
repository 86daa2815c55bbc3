//! Composed state, route decisions and the site configuration

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Query, State},
    Json,
};
use dipto_gate::{Route, RouteDecision};
use dipto_replica::HostView;
use dipto_types::SiteConfiguration;
use serde::{Deserialize, Serialize};

/// Current view: state, view mode, maintenance, banner and stats.
pub async fn get_state(State(state): State<AppState>) -> Json<HostView> {
    Json(state.host.view())
}

#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub route: Route,
    pub decision: RouteDecision,
}

/// What the render layer should show for `?path=`.
pub async fn decide_route(
    State(state): State<AppState>,
    Query(query): Query<RouteQuery>,
) -> ApiResult<Json<RouteResponse>> {
    if !query.path.starts_with('/') {
        return Err(ApiError::BadRequest(format!(
            "path must start with '/': {}",
            query.path
        )));
    }
    Ok(Json(RouteResponse {
        route: Route::classify(&query.path),
        decision: state.host.decide(&query.path),
    }))
}

pub async fn get_config(State(state): State<AppState>) -> Json<SiteConfiguration> {
    Json(state.host.state().configuration)
}

/// Save the configuration.
///
/// A rejected write still leaves the new value in the local state; the
/// `WRITE_FAILED` response tells the caller it may not persist.
pub async fn update_config(
    State(state): State<AppState>,
    Json(config): Json<SiteConfiguration>,
) -> ApiResult<Json<SiteConfiguration>> {
    state.require_privileged()?;
    state.host.update_configuration(config.clone()).await?;
    Ok(Json(config))
}
