//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{delete_job, get_analysis_status, health, list_jobs, start_analysis};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Submit a video for analysis
        .route("/analyze", post(start_analysis))
        // Poll job status
        .route("/analyze/status/:job_id", get(get_analysis_status))
        // Job management
        .route("/jobs", get(list_jobs))
        .route("/jobs/:job_id", delete(delete_job));

    let max_body = state.config.max_body_size;
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .nest("/v1", api_routes)
        .route("/health", get(health))
        // Uploads can be large; the multipart extractor reads the whole
        // body, so both limits must agree
        .layer(DefaultBodyLimit::max(max_body))
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(AllowOrigin::list(parsed))
    }
}
