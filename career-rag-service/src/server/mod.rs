//! HTTP surface of the service.

pub mod errors;
pub mod handlers;
pub mod state;

use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use errors::ApiError;
pub use state::AppState;

/// Creates the application router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/ai/complete-analysis", post(handlers::complete_analysis))
        .route(
            "/api/admin/reindex-documents",
            post(handlers::reindex_documents),
        )
        .route("/api/ml/predict-code", post(handlers::predict_code))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
