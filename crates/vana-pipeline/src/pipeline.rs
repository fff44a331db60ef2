//! The per-job processing pipeline.
//!
//! One invocation of [`run_pipeline`] takes a job from `Pending` to a
//! terminal state: split the source into fixed-duration segments, analyze
//! each segment with bounded retries, persist progress after every segment,
//! aggregate the outcomes into the report, and mark the job complete.
//!
//! Failure semantics are asymmetric by design: a segmentation failure fails
//! the job, but an individual segment's analysis failure does not. The
//! exhausted error is recorded inline in the report and the job still
//! completes.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use tracing::{error, info, warn};

use vana_analysis::{with_retry, AnalysisResult};
use vana_models::{JobId, Segment, SegmentAnalysis, SegmentOutcome};
use vana_store::JobStore;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::report::build_report;

/// Splits a source video into chronological segments.
#[async_trait]
pub trait Splitter: Send + Sync {
    async fn split(&self, source: &Path, job_id: &JobId) -> PipelineResult<Vec<Segment>>;
}

/// Produces a summary for one video segment. A single attempt; the pipeline
/// wraps calls in the retry policy.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, segment_path: &Path) -> AnalysisResult<String>;
}

/// Everything one pipeline run needs, cheap to clone into a spawned task.
#[derive(Clone)]
pub struct PipelineContext {
    pub store: JobStore,
    pub splitter: Arc<dyn Splitter>,
    pub analyzer: Arc<dyn Analyzer>,
    pub config: Arc<PipelineConfig>,
}

/// Drive one job through the pipeline, recording the terminal state in the
/// store. Never returns an error to the caller; all failures are persisted
/// (or, for a job deleted mid-flight, logged and dropped).
pub async fn run_pipeline(ctx: PipelineContext, job_id: JobId, source: std::path::PathBuf) {
    let outcome = process_job(&ctx, &job_id, &source).await;

    match outcome {
        Ok(Run::Completed { segments, errors }) => {
            info!(job_id = %job_id, segments, errors, "job complete");
        }
        Ok(Run::Abandoned) => {
            // The row vanished mid-run: the job was deleted while
            // processing. Treat as cancellation, not failure. The report
            // file may already be on disk if the delete landed between the
            // final progress write and completion; no later delete can
            // reach it, so remove it here.
            warn!(job_id = %job_id, "job deleted mid-pipeline, abandoning");
            cleanup_report(&ctx, &job_id).await;
        }
        Err(e) => {
            error!(job_id = %job_id, error = %e, "pipeline failed");
            match ctx.store.fail(&job_id, &e.to_string()).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(job_id = %job_id, "job deleted before failure could be recorded");
                }
                Err(store_err) => {
                    error!(job_id = %job_id, error = %store_err, "failed to record job failure");
                }
            }
        }
    }

    cleanup_chunks(&ctx, &job_id).await;
}

enum Run {
    Completed { segments: usize, errors: usize },
    Abandoned,
}

async fn process_job(ctx: &PipelineContext, job_id: &JobId, source: &Path) -> PipelineResult<Run> {
    if !ctx.store.mark_processing(job_id).await? {
        return Ok(Run::Abandoned);
    }

    let segments = ctx
        .splitter
        .split(source, job_id)
        .await
        .map_err(|e| PipelineError::Segmentation(e.to_string()))?;

    let total = segments.len() as u32;
    if !ctx.store.update_progress(job_id, 0, Some(total)).await? {
        return Ok(Run::Abandoned);
    }

    let mut analyses = Vec::with_capacity(segments.len());
    for segment in &segments {
        let outcome = analyze_segment(ctx, job_id, segment).await;
        analyses.push(SegmentAnalysis::from_segment(segment, outcome));

        if !ctx
            .store
            .update_progress(job_id, segment.index, Some(total))
            .await?
        {
            return Ok(Run::Abandoned);
        }
    }

    let report = build_report(&analyses, ctx.config.segment_seconds, Local::now());

    let report_path = ctx.config.report_path(job_id.as_str());
    tokio::fs::write(&report_path, &report).await?;

    if !ctx.store.complete(job_id, &report).await? {
        return Ok(Run::Abandoned);
    }

    let errors = analyses.iter().filter(|a| a.outcome.is_error()).count();
    Ok(Run::Completed {
        segments: analyses.len(),
        errors,
    })
}

/// Analyze one segment under the retry policy. An exhausted budget becomes
/// an inline error outcome rather than a pipeline error.
async fn analyze_segment(
    ctx: &PipelineContext,
    job_id: &JobId,
    segment: &Segment,
) -> SegmentOutcome {
    let result = with_retry(&ctx.config.retry, || {
        ctx.analyzer.analyze(&segment.path)
    })
    .await;

    match result {
        Ok(summary) => SegmentOutcome::Summary(summary),
        Err(e) => {
            warn!(
                job_id = %job_id,
                segment = segment.index,
                error = %e,
                "segment analysis failed, recording inline"
            );
            SegmentOutcome::Error(e.to_string())
        }
    }
}

/// Best-effort removal of an orphaned report file.
async fn cleanup_report(ctx: &PipelineContext, job_id: &JobId) {
    let report_path = ctx.config.report_path(job_id.as_str());
    if let Err(e) = tokio::fs::remove_file(&report_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(job_id = %job_id, error = %e, "failed to remove report file");
        }
    }
}

/// Best-effort removal of the per-job chunk directory.
async fn cleanup_chunks(ctx: &PipelineContext, job_id: &JobId) {
    let chunk_dir = ctx.config.job_chunk_dir(job_id.as_str());
    if let Err(e) = tokio::fs::remove_dir_all(&chunk_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(job_id = %job_id, error = %e, "failed to remove chunk directory");
        }
    }
}
