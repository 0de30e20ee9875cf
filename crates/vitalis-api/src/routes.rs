//! Router setup with all API routes and middleware.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
///
/// CORS is open to every origin; uploads are capped at
/// `general.body_limit_mb`.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.general.body_limit_mb.saturating_mul(1024 * 1024);

    Router::new()
        .route("/text", post(handlers::text))
        .route("/voice", post(handlers::voice))
        .route("/pdf", post(handlers::pdf))
        .route("/image", post(handlers::image))
        .route("/audio", post(handlers::audio))
        .route("/video", post(handlers::video))
        .route(
            "/health",
            get(handlers::health_check).post(handlers::support),
        )
        .route("/financial", post(handlers::financial))
        .route("/personalized", post(handlers::personalized))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
