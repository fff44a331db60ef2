//! Pipeline configuration.

use std::path::PathBuf;

use vana_analysis::RetryPolicy;

/// Directories and knobs for the processing pipeline, constructed once at
/// startup and shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Where uploaded source videos land
    pub upload_dir: PathBuf,
    /// Parent of the per-job chunk directories
    pub chunks_dir: PathBuf,
    /// Where finished reports are written
    pub reports_dir: PathBuf,
    /// Fixed segment duration in seconds
    pub segment_seconds: u32,
    /// Upper bound on concurrently running pipelines
    pub max_concurrent_jobs: usize,
    /// Per-segment analysis retry budget
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            chunks_dir: PathBuf::from("chunks"),
            reports_dir: PathBuf::from("reports"),
            segment_seconds: 300,
            max_concurrent_jobs: 4,
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Build from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            upload_dir: env_path("UPLOAD_DIR").unwrap_or(defaults.upload_dir),
            chunks_dir: env_path("CHUNKS_DIR").unwrap_or(defaults.chunks_dir),
            reports_dir: env_path("REPORTS_DIR").unwrap_or(defaults.reports_dir),
            segment_seconds: env_parse("SEGMENT_SECONDS").unwrap_or(defaults.segment_seconds),
            max_concurrent_jobs: env_parse("PIPELINE_MAX_JOBS")
                .unwrap_or(defaults.max_concurrent_jobs),
            retry: RetryPolicy::default(),
        }
    }

    /// Create the upload, chunk, and report directories if they are missing.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::create_dir_all(&self.chunks_dir).await?;
        tokio::fs::create_dir_all(&self.reports_dir).await?;
        Ok(())
    }

    /// Path of the saved source video for a job.
    pub fn upload_path(&self, file_name: &str) -> PathBuf {
        self.upload_dir.join(file_name)
    }

    /// Per-job chunk directory.
    pub fn job_chunk_dir(&self, job_id: &str) -> PathBuf {
        self.chunks_dir.join(job_id)
    }

    /// Path of the finished report for a job.
    pub fn report_path(&self, job_id: &str) -> PathBuf {
        self.reports_dir.join(format!("{job_id}_report.txt"))
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key).ok().map(PathBuf::from)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
