//! Bounded sequential retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use melkyar_protocol::constants::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY};

use crate::error::UploadError;

/// Retry policy applied to each chunk independently.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per chunk (values below 1 are treated as 1).
    pub max_retries: u32,
    /// Delay after the first failed attempt; doubles after each further failure.
    pub base_delay: Duration,
    /// Whether definitive 4xx rejections are retried like any other failure.
    pub retry_rejections: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_RETRY_BASE_DELAY,
            retry_rejections: true,
        }
    }
}

impl RetryPolicy {
    /// `base_delay * 2^attempt`, for a zero-based failed `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(31))
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    fn should_retry(&self, err: &UploadError) -> bool {
        self.retry_rejections || !err.is_rejection()
    }
}

/// Runs `operation` until it succeeds or the policy gives up.
///
/// Sleeps only between failed attempts, never after the last one. The
/// error of the final attempt is returned.
pub async fn retry_with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    chunk_index: u64,
    mut operation: F,
) -> Result<T, UploadError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UploadError>>,
{
    let attempts = policy.attempts();
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let exhausted = attempt + 1 >= attempts;
                if exhausted || !policy.should_retry(&err) {
                    return Err(err);
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    chunk_index,
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "chunk upload failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
