//! Test doubles for the provider and sleeper ports.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::ProviderError;
use crate::llm::{Generation, LlmProvider, Sleeper};

/// A provider that replays a fixed script of outcomes.
///
/// Each call pops the next outcome. A call past the end of the script fails
/// with a non-retryable provider error.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Generation, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
    dispatches: Mutex<Vec<Instant>>,
}

impl ScriptedProvider {
    /// Creates a provider with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a successful reply.
    #[must_use]
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.script.lock().push_back(Ok(Generation::text(text)));
        self
    }

    /// Appends a successful reply with usage.
    #[must_use]
    pub fn then_generation(self, generation: Generation) -> Self {
        self.script.lock().push_back(Ok(generation));
        self
    }

    /// Appends a failure.
    #[must_use]
    pub fn then_error(self, error: ProviderError) -> Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// Returns the number of calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }

    /// Returns the prompts received, in call order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Returns the instant of each call, in call order.
    #[must_use]
    pub fn dispatch_times(&self) -> Vec<Instant> {
        self.dispatches.lock().clone()
    }

    /// Returns the number of unused outcomes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, prompt: &str) -> Result<Generation, ProviderError> {
        self.dispatches.lock().push(Instant::now());
        self.prompts.lock().push(prompt.to_string());
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::new("script exhausted")))
    }
}

/// A provider that replies with the user section of the prompt.
#[derive(Debug, Default)]
pub struct EchoProvider {
    calls: Mutex<usize>,
}

impl EchoProvider {
    /// Creates a new echo provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl LlmProvider for EchoProvider {
    async fn generate(&self, prompt: &str) -> Result<Generation, ProviderError> {
        *self.calls.lock() += 1;
        let user = prompt
            .split_once("USER:\n")
            .map_or(prompt, |(_, rest)| rest)
            .trim_end();
        Ok(Generation::text(format!("echo: {user}")))
    }
}

/// A sleeper that records requested durations and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Creates a new recording sleeper.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded durations, in call order.
    #[must_use]
    pub fn recorded(&self) -> Vec<Duration> {
        self.slept.lock().clone()
    }

    /// Returns the sum of recorded durations.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.slept.lock().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_provider_replays_in_order() {
        let provider = ScriptedProvider::new()
            .then_text("first")
            .then_error(ProviderError::with_status(500, "boom"));

        assert_eq!(provider.generate("a").await.unwrap().text, "first");
        assert!(provider.generate("b").await.is_err());
        assert_eq!(provider.prompts(), vec!["a", "b"]);
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test]
    async fn test_scripted_provider_exhausted() {
        let provider = ScriptedProvider::new();
        let err = provider.generate("x").await.unwrap_err();
        assert!(!err.is_rate_limited());
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_echo_provider_returns_user_section() {
        let provider = EchoProvider::new();
        let prompt = crate::llm::compose_prompt("system", "a kanban board");
        let reply = provider.generate(&prompt).await.unwrap();
        assert_eq!(reply.text, "echo: a kanban board");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_recording_sleeper() {
        let sleeper = RecordingSleeper::new();
        sleeper.sleep(Duration::from_secs(2)).await;
        sleeper.sleep(Duration::from_secs(4)).await;
        assert_eq!(sleeper.total(), Duration::from_secs(6));
    }
}
