//! Exponential backoff with jitter for rate-limited provider calls.
//!
//! Only rate-limit failures are retried. Everything else is reported to the
//! caller on the first occurrence.

use crate::config::DesgenConfig;
use crate::errors::ProviderError;
use rand::Rng;
use std::time::Duration;

/// Upper bound (exclusive) of the random jitter added to each backoff delay.
pub const JITTER_CEILING: Duration = Duration::from_millis(500);

/// Backoff schedule for one provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Maximum attempts, including the first.
    max_attempts: u32,
    /// Delay before the second attempt, doubled for each later one.
    base_delay: Duration,
}

impl BackoffPolicy {
    /// Creates a backoff policy.
    ///
    /// `max_attempts` is clamped to at least one.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Creates a backoff policy from `MAX_RETRIES` and `BASE_DELAY_SECONDS`.
    #[must_use]
    pub fn from_config(config: &DesgenConfig) -> Self {
        Self::new(config.max_retries, config.base_delay())
    }

    /// Returns the attempt budget.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the base delay.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay after the given failed attempt (1-indexed), without jitter.
    ///
    /// delay = base * 2^(attempt - 1)
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Delay after the given failed attempt, with jitter in `[0, 0.5s)`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter = rand::thread_rng().gen_range(0.0..JITTER_CEILING.as_secs_f64());
        self.backoff_for(attempt)
            .saturating_add(Duration::from_secs_f64(jitter))
    }

    /// Decides what to do after `attempt` failed with `error`.
    #[must_use]
    pub fn decide(&self, attempt: u32, error: &ProviderError) -> RetryDecision {
        if !error.is_rate_limited() {
            return RetryDecision::NotRetryable;
        }
        if attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }
        RetryDecision::Retry(self.delay_for(attempt))
    }
}

/// Outcome of a retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry(Duration),
    /// Rate-limited on the last attempt, give up.
    GiveUp,
    /// Don't retry, the error is not a rate limit.
    NotRetryable,
}
