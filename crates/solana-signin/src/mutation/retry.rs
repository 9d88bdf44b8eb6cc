/*
[INPUT]:  Failure count and the failure itself
[OUTPUT]: Retry decisions and capped exponential backoff delays
[POS]:    Mutation layer - retry policy
[UPDATE]: When backoff curve or retry classification changes
*/

use std::time::Duration;

use tracing::debug;

/// Classification a mutation needs from its error type
pub trait Retryable {
    /// Another attempt could succeed
    fn is_retryable(&self) -> bool;

    /// The user declined; never retried regardless of [`Retryable::is_retryable`]
    fn is_user_rejection(&self) -> bool {
        false
    }
}

/// Capped exponential backoff: `min(base_delay * 2^n, max_delay)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(3000),
        }
    }
}

impl RetryPolicy {
    /// Fail on the first error
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before the retry that follows failure number `failure_count` (0-based)
    pub fn delay(&self, failure_count: u32) -> Duration {
        2u32.checked_pow(failure_count)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Whether failure number `failure_count` (0-based) should be retried
    pub fn should_retry<E: Retryable>(&self, failure_count: u32, error: &E) -> bool {
        if error.is_user_rejection() {
            debug!("user rejected the request; not retrying");
            return false;
        }
        error.is_retryable() && failure_count < self.max_retries
    }
}
