//! Resilient invocation of the text-generation provider.

use super::prompt::compose_prompt;
use super::provider::{Generation, LlmProvider};
use super::retry::{BackoffPolicy, RetryDecision};
use super::sleeper::{Sleeper, TokioSleeper};
use super::throttle::Throttle;
use crate::config::DesgenConfig;
use crate::errors::{ConfigurationError, DesgenError};
use std::sync::Arc;

/// Wraps a provider with throttling, rate-limit retries and usage logging.
///
/// One invoker is built at startup and shared by every pipeline run; its
/// throttle state is the only mutable state shared between runs.
#[derive(Clone)]
pub struct ResilientInvoker {
    provider: Arc<dyn LlmProvider>,
    sleeper: Arc<dyn Sleeper>,
    backoff: BackoffPolicy,
    throttle: Arc<Throttle>,
    model_name: String,
    log_usage: bool,
}

impl std::fmt::Debug for ResilientInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientInvoker")
            .field("backoff", &self.backoff)
            .field("throttle", &self.throttle.interval())
            .field("model_name", &self.model_name)
            .field("log_usage", &self.log_usage)
            .finish_non_exhaustive()
    }
}

impl ResilientInvoker {
    /// Creates an invoker from the retry, throttle and usage settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the retry or throttle settings are invalid.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        config: &DesgenConfig,
    ) -> Result<Self, ConfigurationError> {
        config.validate_timing()?;
        Ok(Self {
            provider,
            sleeper: Arc::new(TokioSleeper),
            backoff: BackoffPolicy::from_config(config),
            throttle: Arc::new(Throttle::new(config.throttle_interval())),
            model_name: config.model_name.clone(),
            log_usage: config.log_usage,
        })
    }

    /// Replaces the sleeper used for throttle and backoff waits.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Returns the backoff policy.
    #[must_use]
    pub fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }

    /// Returns the shared throttle.
    #[must_use]
    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    /// Sends one role instruction and one user instruction to the provider.
    ///
    /// Waits for the throttle slot, then makes up to `MAX_RETRIES` attempts.
    /// Rate-limited failures are retried after an exponential backoff with
    /// jitter; any other failure, or a rate limit on the last attempt, is
    /// returned immediately. A failed call gives its throttle slot back.
    ///
    /// # Errors
    ///
    /// Returns `DesgenError::Provider` with the provider's error, or
    /// `DesgenError::ExhaustedRetries` if the loop ends without an outcome.
    pub async fn invoke(
        &self,
        system_instruction: &str,
        user_instruction: &str,
    ) -> Result<String, DesgenError> {
        let reservation = self.throttle.reserve();
        let wait = reservation.wait();
        if !wait.is_zero() {
            tracing::debug!(wait_ms = wait.as_millis() as u64, "Throttling provider call");
            self.sleeper.sleep(wait).await;
        }

        let result = self.dispatch(system_instruction, user_instruction).await;
        if result.is_err() {
            self.throttle.release(reservation);
        }
        result
    }

    async fn dispatch(
        &self,
        system_instruction: &str,
        user_instruction: &str,
    ) -> Result<String, DesgenError> {
        let prompt = compose_prompt(system_instruction, user_instruction);
        let max_attempts = self.backoff.max_attempts();

        for attempt in 1..=max_attempts {
            match self.provider.generate(&prompt).await {
                Ok(generation) => {
                    self.throttle.record_success();
                    self.log_usage(&generation);
                    return Ok(generation.text);
                }
                Err(err) => match self.backoff.decide(attempt, &err) {
                    RetryDecision::Retry(delay) => {
                        tracing::warn!(
                            attempt,
                            max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            status_code = err.status_code,
                            error = %err,
                            "Provider rate limited, backing off"
                        );
                        self.sleeper.sleep(delay).await;
                    }
                    RetryDecision::GiveUp => {
                        tracing::error!(attempt, error = %err, "Provider still rate limited, giving up");
                        return Err(err.into());
                    }
                    RetryDecision::NotRetryable => {
                        tracing::error!(
                            attempt,
                            status_code = err.status_code,
                            error = %err,
                            "Provider call failed"
                        );
                        return Err(err.into());
                    }
                },
            }
        }

        Err(DesgenError::ExhaustedRetries {
            attempts: max_attempts,
        })
    }

    fn log_usage(&self, generation: &Generation) {
        if !self.log_usage {
            return;
        }
        if let Some(usage) = generation.usage {
            tracing::info!(
                model = %self.model_name,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                total_tokens = usage.total_tokens,
                "LLM usage"
            );
        }
    }
}
