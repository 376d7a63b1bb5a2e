//! Reusable retry policy for store round-trips.
//!
//! Transient store errors are retried with exponential backoff; every
//! other error class (validation, not-found, conflict) propagates
//! immediately. One policy instance is shared by all store operations
//! instead of ad hoc loops at each call site.

use std::future::Future;
use std::time::Duration;

use crate::error::DispatchError;

/// Retry settings for store round-trips.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each subsequent attempt.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
        }
    }
}

/// Executes operations under the configured retry policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Creates a policy from the given settings.
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Runs `attempt` until it succeeds, fails non-transiently, or the
    /// attempt budget is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the last error once attempts are exhausted, or the first
    /// non-transient error immediately.
    pub async fn run<T, F, Fut>(&self, op: &str, mut attempt: F) -> Result<T, DispatchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DispatchError>>,
    {
        let mut delay = Duration::from_millis(self.config.base_delay_ms);
        let mut tries = 1u32;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && tries < self.config.max_attempts => {
                    tracing::warn!(op, attempt = tries, error = %err, "transient store error; retrying");
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    tries += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
