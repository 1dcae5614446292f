//! REST API module using Axum
//!
//! JSON-only HTTP surface for the complaint core:
//! - citizen intake and tracking
//! - authority lifecycle transitions
//! - dashboard queue query and aggregate stats
//!
//! UI rendering is out of scope; every endpoint returns the shared
//! `data`/`error` envelope.

pub mod envelope;
pub mod handlers;

mod routes;

pub use handlers::ApiState;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted intake body (photo plus form fields).
const MAX_INTAKE_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `JANSAHAYAK_CORS_ORIGINS` to a comma-separated list of allowed
/// origins for development (e.g., a local portal frontend dev server).
fn build_cors_layer() -> CorsLayer {
    match std::env::var("JANSAHAYAK_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        }
        Err(_) => CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    }
}

/// Create the complete application router.
pub fn create_app(state: ApiState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(routes::health_routes(state))
        .layer(DefaultBodyLimit::max(MAX_INTAKE_BODY_BYTES))
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
}
