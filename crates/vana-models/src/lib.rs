//! Shared data models for the video analysis backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and their lifecycle states
//! - Segments produced by the splitter and their analysis outcomes
//! - The JSON views returned by the HTTP layer

pub mod job;
pub mod segment;
pub mod view;

// Re-export common types
pub use job::{Job, JobId, JobStatus, NewJob, ParseStatusError};
pub use segment::{Segment, SegmentAnalysis, SegmentOutcome};
pub use view::JobView;
