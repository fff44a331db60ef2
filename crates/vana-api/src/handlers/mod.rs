//! HTTP request handlers.

pub mod analyze;
pub mod health;
pub mod jobs;

pub use analyze::{get_analysis_status, start_analysis};
pub use health::health;
pub use jobs::{delete_job, list_jobs};
