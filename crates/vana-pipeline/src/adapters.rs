//! Production implementations of the pipeline seams.

use std::path::Path;

use async_trait::async_trait;

use vana_analysis::{AnalysisResult, GeminiClient};
use vana_media::Segmenter;
use vana_models::{JobId, Segment};

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{Analyzer, Splitter};

#[async_trait]
impl Splitter for Segmenter {
    async fn split(&self, source: &Path, job_id: &JobId) -> PipelineResult<Vec<Segment>> {
        Segmenter::split(self, source, job_id)
            .await
            .map_err(|e| PipelineError::Segmentation(e.to_string()))
    }
}

#[async_trait]
impl Analyzer for GeminiClient {
    async fn analyze(&self, segment_path: &Path) -> AnalysisResult<String> {
        GeminiClient::analyze(self, segment_path).await
    }
}
