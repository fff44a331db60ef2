//! JSON views of a job as returned by the HTTP layer.
//!
//! Field names are part of the status API contract and must not drift:
//! `jobId`/`fileSize` are camelCase, the rest snake_case.

use serde::Serialize;

use crate::job::{Job, JobStatus};

/// Point-in-time snapshot of a job's persisted state.
#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    #[serde(rename = "jobId")]
    pub job_id: String,
    pub status: JobStatus,
    pub created_at: String,
    pub updated_at: String,
    pub filename: Option<String>,
    #[serde(rename = "fileSize")]
    pub file_size: Option<i64>,
    pub chunks_processed: u32,
    /// 0 until segmentation has completed
    pub total_chunks: u32,
    /// Present only when the job is `Complete`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    /// Present only when the job is `Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobView {
    /// Full view, including the report or error once terminal.
    pub fn detailed(job: &Job) -> Self {
        let mut view = Self::summary(job);
        if job.status == JobStatus::Complete {
            view.report = job.report.clone();
        }
        if job.status == JobStatus::Failed {
            view.error = job.error.clone();
        }
        view
    }

    /// List view: identity, state and counters without the report payload.
    pub fn summary(job: &Job) -> Self {
        Self {
            job_id: job.id.to_string(),
            status: job.status,
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
            filename: job.video_filename.clone(),
            file_size: job.video_size,
            chunks_processed: job.chunks_processed,
            total_chunks: job.total_chunks.unwrap_or(0),
            report: None,
            error: None,
        }
    }
}
