//! Bounded retry with exponential backoff, driven by error classification.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};

/// Retry budget for one segment's analysis.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// How many times a rate-limited call may be retried after waiting
    pub max_rate_limit_retries: u32,
    /// How many immediate retries a transient failure gets
    pub max_transient_retries: u32,
    /// Base delay for transient backoff (doubles each attempt)
    pub base_delay: Duration,
    /// Cap on any single backoff delay
    pub max_delay: Duration,
    /// Wait applied when the service gives no Retry-After hint
    pub default_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_rate_limit_retries: 3,
            max_transient_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            default_retry_after: Duration::from_secs(15),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay for the given attempt number (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        delay.min(self.max_delay)
    }
}

/// Run `operation` until it succeeds or its retry budget is exhausted.
///
/// Rate-limited failures wait for the service-indicated delay (or the policy
/// default) before retrying; transient failures back off exponentially;
/// fatal failures return immediately. The budget tracks the two retryable
/// classes separately so a burst of rate limiting cannot consume the
/// transient budget or vice versa.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: F) -> AnalysisResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = AnalysisResult<T>>,
{
    let mut rate_limit_attempts = 0u32;
    let mut transient_attempts = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(AnalysisError::RateLimited { retry_after })
                if rate_limit_attempts < policy.max_rate_limit_retries =>
            {
                rate_limit_attempts += 1;
                let delay = retry_after.unwrap_or(policy.default_retry_after);
                debug!(
                    attempt = rate_limit_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "rate limited, waiting before retry"
                );
                tokio::time::sleep(delay).await;
            }
            Err(AnalysisError::Transient(reason))
                if transient_attempts < policy.max_transient_retries =>
            {
                transient_attempts += 1;
                let delay = policy.delay_for_attempt(transient_attempts);
                debug!(
                    attempt = transient_attempts,
                    delay_ms = delay.as_millis() as u64,
                    %reason,
                    "transient analysis failure, backing off"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
