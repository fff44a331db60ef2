//! Pipeline error types.

use thiserror::Error;
use vana_store::StoreError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Segmentation failed outright; pipeline-fatal, the job moves to `Failed`
    #[error("Failed to chunk video: {0}")]
    Segmentation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
