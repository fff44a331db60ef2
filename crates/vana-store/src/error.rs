//! Error types for the job store.

use thiserror::Error;
use vana_models::ParseStatusError;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt job row: {0}")]
    InvalidStatus(#[from] ParseStatusError),
}
