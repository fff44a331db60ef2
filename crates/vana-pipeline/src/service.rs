//! The job service facade the HTTP layer calls into.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use vana_models::{Job, JobId, JobStatus, NewJob};
use vana_store::{JobStore, StoreResult};

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::pipeline::{run_pipeline, PipelineContext};
use crate::runner::PipelineRunner;

/// Coordinates uploads, the job store, and pipeline execution.
#[derive(Clone)]
pub struct JobService {
    config: Arc<PipelineConfig>,
    store: JobStore,
    ctx: PipelineContext,
    runner: Arc<PipelineRunner>,
}

impl JobService {
    pub fn new(ctx: PipelineContext) -> Self {
        let runner = Arc::new(PipelineRunner::new(ctx.config.max_concurrent_jobs));
        Self {
            config: Arc::clone(&ctx.config),
            store: ctx.store.clone(),
            ctx,
            runner,
        }
    }

    /// Accept an upload: persist the video, create the job row as `Pending`,
    /// and hand the job to the pipeline runner. Returns as soon as the row
    /// exists; processing happens in the background.
    pub async fn submit(&self, data: Vec<u8>, filename: Option<String>) -> PipelineResult<Job> {
        let job_id = JobId::new();
        let extension = filename
            .as_deref()
            .and_then(file_extension)
            .unwrap_or("mp4");

        let source = self
            .config
            .upload_path(&format!("{}.{extension}", job_id.as_str()));
        tokio::fs::write(&source, &data).await?;

        let job = self
            .store
            .create(NewJob {
                id: job_id.clone(),
                video_path: source.to_string_lossy().into_owned(),
                video_filename: filename,
                video_size: Some(data.len() as i64),
            })
            .await?;

        info!(
            job_id = %job_id,
            size = data.len(),
            filename = job.video_filename.as_deref().unwrap_or("<unnamed>"),
            "job accepted"
        );

        self.runner
            .spawn(&job_id, run_pipeline(self.ctx.clone(), job_id.clone(), source))
            .await;

        Ok(job)
    }

    /// Look up one job.
    pub async fn query(&self, id: &JobId) -> StoreResult<Option<Job>> {
        self.store.get(id).await
    }

    /// Paginated job listing, optionally filtered by status.
    pub async fn list(
        &self,
        offset: i64,
        limit: i64,
        status: Option<JobStatus>,
    ) -> StoreResult<Vec<Job>> {
        self.store.list(offset, limit, status).await
    }

    /// Delete a job row and its artifacts. Returns `false` if no such job
    /// existed. A pipeline running for this job notices the missing row at
    /// its next write and abandons.
    pub async fn remove(&self, id: &JobId) -> StoreResult<bool> {
        let Some(job) = self.store.delete(id).await? else {
            return Ok(false);
        };

        remove_file_quiet(Path::new(&job.video_path)).await;
        remove_file_quiet(&self.config.report_path(id.as_str())).await;

        let chunk_dir = self.config.job_chunk_dir(id.as_str());
        if let Err(e) = tokio::fs::remove_dir_all(&chunk_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(job_id = %id, error = %e, "failed to remove chunk directory");
            }
        }

        info!(job_id = %id, "job deleted");
        Ok(true)
    }

    /// Number of pipelines currently tracked by the runner.
    pub async fn active_pipelines(&self) -> usize {
        self.runner.in_flight_count().await
    }

    /// Abort all in-flight pipelines. Used on shutdown.
    pub async fn shutdown(&self) {
        self.runner.abort_all().await;
    }
}

/// Extension of an uploaded filename, without the dot.
fn file_extension(filename: &str) -> Option<&str> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
}

async fn remove_file_quiet(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove artifact");
        }
    }
}
