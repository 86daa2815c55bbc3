//! GeminiWriter against a local stand-in for the generateContent API.

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use dipto_copywriter::{CopyError, DescriptionWriter, GeminiConfig, GeminiWriter};
use serde_json::{json, Value};
use std::collections::HashMap;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn writer(endpoint: String) -> GeminiWriter {
    GeminiWriter::new(&GeminiConfig {
        endpoint: Some(endpoint),
        model: "test-model".to_string(),
        api_key: Some("test-key".to_string()),
        ..GeminiConfig::default()
    })
    .unwrap()
}

async fn generate(
    Path(target): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    if target != "test-model:generateContent" || query.get("key").map(String::as_str) != Some("test-key") {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
    if !prompt.contains("\"Rust for Services\" in the Development category") {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Json(json!({
        "candidates": [{"content": {"parts": [{"text": "\n  Build fast, reliable services.  \n"}]}}]
    })))
}

#[tokio::test]
async fn description_is_trimmed_candidate_text() {
    let base = serve(Router::new().route("/v1beta/models/:target", post(generate))).await;
    let text = writer(base)
        .describe("Rust for Services", "Development")
        .await
        .unwrap();
    assert_eq!(text, "Build fast, reliable services.");
}

#[tokio::test]
async fn non_success_status_is_surfaced() {
    let app = Router::new().route(
        "/v1beta/models/:target",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
    );
    let base = serve(app).await;
    let err = writer(base).describe("Rust", "Development").await.unwrap_err();
    match err {
        CopyError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "overloaded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_candidate_is_an_error() {
    let app = Router::new().route(
        "/v1beta/models/:target",
        post(|| async { Json(json!({"candidates": [{"content": {"parts": [{"text": "   "}]}}]})) }),
    );
    let base = serve(app).await;
    let err = writer(base).describe("Rust", "Development").await.unwrap_err();
    assert!(matches!(err, CopyError::EmptyResponse));
}

#[tokio::test]
async fn transport_error_does_not_leak_the_api_key() {
    // nothing listens on the discard port
    let err = writer("http://127.0.0.1:9".to_string())
        .describe("Rust", "Development")
        .await
        .unwrap_err();
    assert!(matches!(err, CopyError::Request(_)));
    let message = err.to_string();
    assert!(!message.contains("key="), "{message}");
    assert!(!message.contains("test-key"), "{message}");
}
