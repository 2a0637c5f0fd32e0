use crate::AppState;
use axum::{Router, routing::get};

/// Public Router Module
///
/// Unauthenticated endpoints used by load balancers and monitoring.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Answers "ok" as long as the process is serving requests.
        .route("/health", get(|| async { "ok" }))
}
