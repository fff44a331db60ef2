//! Error taxonomy for segment analysis.

use std::time::Duration;
use thiserror::Error;

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Classified failure of one analysis call.
///
/// The classification drives the caller's retry decision: rate limits wait
/// for the indicated delay, transient failures back off briefly, fatal
/// failures are recorded immediately.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis service rate limit exceeded")]
    RateLimited {
        /// Delay suggested by the service, if any
        retry_after: Option<Duration>,
    },

    #[error("transient analysis failure: {0}")]
    Transient(String),

    #[error("analysis failed: {0}")]
    Fatal(String),

    #[error("analysis client configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
