use crate::AppState;
use axum::{Router, routing::get};

/// Public Router Module
///
/// Unauthenticated endpoints. Content is only reachable through the role-gated
/// private routes.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers; always "ok".
        .route("/health", get(|| async { "ok" }))
}
