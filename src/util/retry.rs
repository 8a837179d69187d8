//! Fixed-attempt retry for remote calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ChatError;

/// How often, and how patiently, a remote call is retried.
///
/// `max_attempts` counts the first try, so `max_retries = 2` in the config
/// becomes `max_attempts = 3` here.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
    /// Backoff growth factor per retry.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that tries exactly once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent. The last error is returned.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, ChatError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ChatError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;

        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if attempt >= attempts || !err.is_retryable() {
                return Err(err);
            }

            let wait = self.delay_for(&err, backoff);
            warn!(attempt, max_attempts = attempts, error = %err, delay_ms = wait.as_millis() as u64, "Remote call failed, retrying");
            tokio::time::sleep(wait).await;

            backoff = backoff.mul_f64(self.multiplier).min(self.max_backoff);
            attempt += 1;
        }
    }

    /// Server-provided retry hints win over the computed backoff.
    fn delay_for(&self, err: &ChatError, backoff: Duration) -> Duration {
        if let ChatError::RateLimited {
            retry_after_ms: Some(ms),
        } = err
        {
            return Duration::from_millis(*ms).min(self.max_backoff);
        }
        // 75%..125% jitter
        backoff.mul_f64(0.75 + jitter() * 0.5)
    }
}

/// Uniform-ish value in [0, 1) from a random v4 uuid.
fn jitter() -> f64 {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    let n = u16::from_le_bytes([bytes[0], bytes[1]]);
    f64::from(n) / f64::from(u16::MAX as u32 + 1)
}
