//! Pipeline orchestration for video analysis jobs.
//!
//! This crate drives a job from submission to its terminal state:
//! segmentation, per-segment analysis with bounded retries, progress
//! persistence after every segment, and aggregation of the per-segment
//! outcomes into the final report. It also provides the narrow facade the
//! HTTP layer calls into ([`JobService`]) and the supervised task runner
//! that owns in-flight pipelines ([`PipelineRunner`]).

pub mod adapters;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod service;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{run_pipeline, Analyzer, PipelineContext, Splitter};
pub use report::build_report;
pub use runner::PipelineRunner;
pub use service::JobService;
