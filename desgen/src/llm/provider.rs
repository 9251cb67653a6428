//! Provider port and response types.

use crate::errors::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Token usage reported by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub input_tokens: u64,
    /// Tokens generated.
    pub output_tokens: u64,
    /// Total tokens billed.
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Creates usage from input and output counts; the total is their sum.
    #[must_use]
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
        }
    }
}

/// Text produced by one provider call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    /// The generated text.
    pub text: String,
    /// Usage data, when the provider reported it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl Generation {
    /// Creates a generation without usage data.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }

    /// Attaches usage data.
    #[must_use]
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// A text-generation backend.
///
/// Given a fully composed prompt, returns generated text or a
/// `ProviderError` carrying an optional status code.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generates text for the prompt.
    async fn generate(&self, prompt: &str) -> Result<Generation, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_total_is_sum() {
        assert_eq!(TokenUsage::new(12, 30).total_tokens, 42);
    }

    #[test]
    fn test_usage_total_saturates() {
        assert_eq!(TokenUsage::new(u64::MAX, 1).total_tokens, u64::MAX);
    }
}
