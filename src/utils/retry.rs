//! Retry logic with a fixed pause between attempts
//!
//! Transfers are retried on a flat interval: no exponential growth and no
//! jitter. The attempt count is reported back so callers can surface it.

use crate::config::StorageConfig;
use crate::error::BlobCliError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, interval: Duration) -> Self {
        Self {
            max_retries,
            interval,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.max_retries(), config.retry_interval())
    }

    /// Exactly one attempt
    pub fn single_attempt() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// The last error of an operation that never succeeded, with the number of
/// attempts that were made.
#[derive(Debug)]
pub struct RetryError {
    pub attempts: u32,
    pub error: BlobCliError,
}

/// Run `operation` until it succeeds, the policy is exhausted, or it fails
/// with an error `is_retryable` rejects.
///
/// The operation receives the 1-based attempt number. The pause happens only
/// between attempts, never after the last one.
pub async fn retry_with_interval<T, F, Fut, R>(
    policy: RetryPolicy,
    mut operation: F,
    is_retryable: R,
) -> std::result::Result<T, RetryError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = crate::error::Result<T>>,
    R: Fn(&BlobCliError) -> bool,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation(attempt).await {
            Ok(result) => return Ok(result),
            Err(error) => {
                if attempt >= max_attempts || !is_retryable(&error) {
                    return Err(RetryError {
                        attempts: attempt,
                        error,
                    });
                }

                tracing::debug!(
                    attempt = attempt,
                    max_attempts = max_attempts,
                    interval_ms = policy.interval.as_millis() as u64,
                    "Sleeping before next attempt"
                );
                sleep(policy.interval).await;
            }
        }
    }
}
