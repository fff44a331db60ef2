//! Application state.

use std::sync::Arc;

use vana_analysis::{AnalysisConfig, GeminiClient};
use vana_media::{Segmenter, SegmenterConfig};
use vana_pipeline::{JobService, PipelineConfig, PipelineContext};
use vana_store::JobStore;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub service: JobService,
}

impl AppState {
    /// Create new application state: open the job store, prepare the work
    /// directories, and wire up the pipeline.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let db_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:jobs.db?mode=rwc".to_string());
        let store = JobStore::connect(&db_url).await?;
        store.init().await?;

        let pipeline_config = Arc::new(PipelineConfig::from_env());
        pipeline_config.ensure_dirs().await?;

        let segmenter = Segmenter::new(SegmenterConfig {
            chunks_dir: pipeline_config.chunks_dir.clone(),
            segment_seconds: pipeline_config.segment_seconds,
            ffmpeg_timeout_secs: std::env::var("FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok()),
        });

        let analyzer = GeminiClient::new(AnalysisConfig::from_env()?)?;

        let ctx = PipelineContext {
            store,
            splitter: Arc::new(segmenter),
            analyzer: Arc::new(analyzer),
            config: pipeline_config,
        };

        Ok(Self {
            config,
            service: JobService::new(ctx),
        })
    }
}
