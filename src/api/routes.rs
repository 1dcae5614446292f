//! API route definitions
//!
//! Endpoints for the citizen portal and authority dashboard:
//! - POST /api/v1/complaints - intake (multipart form)
//! - GET  /api/v1/complaints - dashboard queue query
//! - GET  /api/v1/complaints/recent - latest complaints
//! - GET  /api/v1/complaints/:id - citizen tracking
//! - POST /api/v1/complaints/:id/transition - authority lifecycle update
//! - GET  /api/v1/stats - aggregate dashboard stats

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, ApiState};

/// Create all API routes for the portal
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route(
            "/complaints",
            post(handlers::submit_complaint).get(handlers::query_complaints),
        )
        .route("/complaints/recent", get(handlers::recent_complaints))
        .route("/complaints/:id", get(handlers::get_complaint))
        .route(
            "/complaints/:id/transition",
            post(handlers::transition_complaint),
        )
        .route("/stats", get(handlers::get_stats))
        .with_state(state)
}

/// Health endpoint at root level
pub fn health_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state)
}
