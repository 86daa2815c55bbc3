//! Course description drafts

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct DescribeRequest {
    pub title: String,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "Development".to_string()
}

#[derive(Debug, Serialize)]
pub struct DescribeResponse {
    pub text: String,
}

/// One draft per call, never retried.
pub async fn describe(
    State(state): State<AppState>,
    Json(request): Json<DescribeRequest>,
) -> ApiResult<Json<DescribeResponse>> {
    state.require_privileged()?;
    let writer = state
        .writer
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("copywriter has no API key".to_string()))?;
    let text = writer.describe(&request.title, &request.category).await?;
    Ok(Json(DescribeResponse { text }))
}
