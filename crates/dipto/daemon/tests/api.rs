//! REST API over a running replica host with in-memory backends.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use dipto_daemon::api::{create_router, AppState};
use dipto_replica::ReplicaHost;
use dipto_store::memory::{InMemoryDocumentStore, InMemoryIdentityProvider};
use dipto_types::{ReplicaState, SiteConfiguration, PRIVILEGED_IDENTITY_LABEL};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use tower::ServiceExt;

const ADMIN_SECRET: &str = "admin-secret";

struct Fixture {
    host: Arc<ReplicaHost>,
    rx: watch::Receiver<ReplicaState>,
    app: Router,
}

async fn fixture() -> Fixture {
    let store = Arc::new(InMemoryDocumentStore::new());
    let provider = Arc::new(
        InMemoryIdentityProvider::new()
            .with_account(PRIVILEGED_IDENTITY_LABEL, ADMIN_SECRET)
            .with_account("visitor@example.com", "visitor-secret"),
    );
    let host = Arc::new(ReplicaHost::new(store, provider));
    let mut rx = host.start().unwrap();
    wait_for(&mut rx, |state| !state.initializing && state.catalog.len() == 2).await;

    let app = create_router(AppState::new(host.clone(), None), false);
    Fixture { host, rx, app }
}

async fn wait_for(
    rx: &mut watch::Receiver<ReplicaState>,
    mut predicate: impl FnMut(&ReplicaState) -> bool,
) -> ReplicaState {
    let state = timeout(Duration::from_secs(2), rx.wait_for(|state| predicate(state)))
        .await
        .expect("state never matched")
        .expect("host dropped");
    state.clone()
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn sign_in_admin(app: &Router) {
    let (status, _) = call(
        app,
        Method::POST,
        "/api/v1/auth/sign-in",
        Some(json!({"label": PRIVILEGED_IDENTITY_LABEL, "secret": ADMIN_SECRET})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

fn draft(title: &str) -> Value {
    json!({
        "title": title,
        "category": "Development",
        "price": 19.5,
        "description": "Async services end to end.",
        "image_ref": "https://example.com/rust.png",
        "level": "Intermediate",
        "status": "Published"
    })
}

#[tokio::test]
async fn state_and_route_decisions_are_served() {
    let f = fixture().await;

    let (status, view) = call(&f.app, Method::GET, "/api/v1/state", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["view_mode"], "Public");
    assert_eq!(view["state"]["catalog"].as_array().map(Vec::len), Some(2));
    assert!(view["banner"].is_null());

    let (status, body) = call(&f.app, Method::GET, "/api/v1/route?path=/admin", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["decision"], json!({"Redirect": "/auth"}));

    let (status, body) = call(&f.app, Method::GET, "/api/v1/route?path=admin", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    f.host.stop().await;
}

#[tokio::test]
async fn mutations_need_the_privileged_identity() {
    let mut f = fixture().await;
    let config = serde_json::to_value(SiteConfiguration {
        display_name: "Renamed".to_string(),
        ..SiteConfiguration::default()
    })
    .unwrap();

    let (status, _) = call(&f.app, Method::PUT, "/api/v1/config", Some(config.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    call(
        &f.app,
        Method::POST,
        "/api/v1/auth/sign-in",
        Some(json!({"label": "visitor@example.com", "secret": "visitor-secret"})),
    )
    .await;
    let (status, _) = call(&f.app, Method::DELETE, "/api/v1/courses/1", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(f.host.state().catalog.len(), 2);

    sign_in_admin(&f.app).await;
    let (status, _) = call(&f.app, Method::PUT, "/api/v1/config", Some(config)).await;
    assert_eq!(status, StatusCode::OK);
    wait_for(&mut f.rx, |state| state.configuration.display_name == "Renamed").await;

    let (status, _) = call(&f.app, Method::DELETE, "/api/v1/courses/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    wait_for(&mut f.rx, |state| state.catalog.len() == 1).await;

    f.host.stop().await;
}

#[tokio::test]
async fn course_lifecycle_through_the_api() {
    let mut f = fixture().await;
    sign_in_admin(&f.app).await;

    let (status, created) = call(&f.app, Method::POST, "/api/v1/courses", Some(draft("Rust for Services"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("course-"));
    wait_for(&mut f.rx, |state| state.catalog.len() == 3).await;

    let (status, item) = call(
        &f.app,
        Method::PUT,
        &format!("/api/v1/courses/{}/status", id),
        Some(json!({"status": "Draft"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["status"], "Draft");
    assert_eq!(item["title"], "Rust for Services");

    wait_for(&mut f.rx, |state| {
        state.catalog.iter().any(|item| item.id.as_str() == id && !item.is_published())
    })
    .await;
    let (status, listed) = call(&f.app, Method::GET, "/api/v1/courses?published=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(2));

    let (status, _) = call(&f.app, Method::GET, "/api/v1/courses/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&f.app, Method::DELETE, &format!("/api/v1/courses/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    wait_for(&mut f.rx, |state| state.catalog.len() == 2).await;

    f.host.stop().await;
}

#[tokio::test]
async fn identity_errors_map_to_status_codes() {
    let f = fixture().await;

    let (status, body) = call(
        &f.app,
        Method::POST,
        "/api/v1/auth/sign-in",
        Some(json!({"label": "visitor@example.com", "secret": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");

    let (status, _) = call(
        &f.app,
        Method::POST,
        "/api/v1/auth/register",
        Some(json!({"label": "new@example.com", "secret": "12345"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = call(&f.app, Method::POST, "/api/v1/auth/sign-out", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    f.host.stop().await;
}

#[tokio::test]
async fn describe_without_api_key_is_unavailable() {
    let f = fixture().await;
    sign_in_admin(&f.app).await;

    let (status, body) = call(
        &f.app,
        Method::POST,
        "/api/v1/describe",
        Some(json!({"title": "Rust for Services"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "UNAVAILABLE");

    f.host.stop().await;
}
