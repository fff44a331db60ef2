//! Client for the external vision analysis service.
//!
//! This crate wraps the Gemini `generateContent` call with:
//! - A per-request timeout
//! - Structured error classification (rate-limited vs. transient vs. fatal)
//! - A bounded retry helper driven by that classification

pub mod client;
pub mod error;
pub mod retry;

pub use client::{AnalysisConfig, GeminiClient, DEFAULT_PROMPT};
pub use error::{AnalysisError, AnalysisResult};
pub use retry::{with_retry, RetryPolicy};
