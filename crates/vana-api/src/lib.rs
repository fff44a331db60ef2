//! Axum HTTP API server.
//!
//! This crate provides:
//! - Video upload and job creation (`POST /v1/analyze`)
//! - Status polling (`GET /v1/analyze/status/{job_id}`)
//! - Job listing and deletion (`GET /v1/jobs`, `DELETE /v1/jobs/{job_id}`)
//! - Health check (`GET /health`)

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
