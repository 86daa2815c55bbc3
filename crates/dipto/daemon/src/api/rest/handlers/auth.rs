//! Identity handlers

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, http::StatusCode, Json};
use dipto_types::Identity;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub label: String,
    pub secret: String,
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<Json<Identity>> {
    let identity = state.host.sign_in(&request.label, &request.secret).await?;
    Ok(Json(identity))
}

/// Create an account; it is signed in on success.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<(StatusCode, Json<Identity>)> {
    let identity = state.host.register(&request.label, &request.secret).await?;
    Ok((StatusCode::CREATED, Json(identity)))
}

pub async fn sign_out(State(state): State<AppState>) -> StatusCode {
    state.host.sign_out().await;
    StatusCode::NO_CONTENT
}
