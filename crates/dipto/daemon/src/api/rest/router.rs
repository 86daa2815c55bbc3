//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let api_routes = Router::new()
        // Health and composed state
        .route("/health", get(handlers::health_check))
        .route("/state", get(handlers::get_state))
        .route("/route", get(handlers::decide_route))
        // Site configuration
        .route("/config", get(handlers::get_config).put(handlers::update_config))
        // Catalog
        .route("/courses", get(handlers::list_courses).post(handlers::create_course))
        .route(
            "/courses/:id",
            get(handlers::get_course)
                .put(handlers::update_course)
                .delete(handlers::delete_course),
        )
        .route("/courses/:id/status", put(handlers::set_course_status))
        .route("/courses/:id/toggle", post(handlers::toggle_course_status))
        .route("/stats", get(handlers::catalog_stats))
        // Identity
        .route("/auth/sign-in", post(handlers::sign_in))
        .route("/auth/register", post(handlers::register))
        .route("/auth/sign-out", post(handlers::sign_out))
        // Copywriter
        .route("/describe", post(handlers::describe));

    let app = Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http());

    let app = if enable_cors {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    };

    app.with_state(state)
}
