//! Job definitions for the analysis pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job lifecycle state.
///
/// Transitions are forward-only: `Pending -> Processing -> {Complete, Failed}`.
/// `Complete` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Job record created, pipeline not yet started
    #[default]
    Pending,
    /// Segmentation or per-segment analysis in progress
    Processing,
    /// Aggregated report produced and persisted
    Complete,
    /// Pipeline-fatal failure (segmentation failed, no output possible)
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Complete => "COMPLETE",
            JobStatus::Failed => "FAILED",
        }
    }

    /// Check if this is a terminal state (no further transitions occur).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a persisted status string cannot be parsed.
#[derive(Debug, Error)]
#[error("unknown job status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for JobStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(JobStatus::Pending),
            "PROCESSING" => Ok(JobStatus::Processing),
            "COMPLETE" => Ok(JobStatus::Complete),
            "FAILED" => Ok(JobStatus::Failed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A persisted analysis job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID, assigned at submission
    pub id: JobId,

    /// Lifecycle state
    pub status: JobStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Refreshed on every state or counter mutation
    pub updated_at: DateTime<Utc>,

    /// Where the uploaded source was persisted
    pub video_path: String,

    /// Original filename as uploaded
    pub video_filename: Option<String>,

    /// Upload size in bytes
    pub video_size: Option<i64>,

    /// Final aggregated report, present only when `Complete`
    pub report: Option<String>,

    /// Terminal failure description, present only when `Failed`
    pub error: Option<String>,

    /// Segments that have received an analysis attempt (success or recorded failure)
    pub chunks_processed: u32,

    /// Set once segmentation completes; unknown before that
    pub total_chunks: Option<u32>,
}

impl Job {
    /// Invariant check: progress never exceeds the known segment count.
    pub fn progress_is_consistent(&self) -> bool {
        match self.total_chunks {
            Some(total) => self.chunks_processed <= total,
            None => true,
        }
    }
}

/// Fields required to create a new job row.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub id: JobId,
    pub video_path: String,
    pub video_filename: Option<String>,
    pub video_size: Option<i64>,
}
