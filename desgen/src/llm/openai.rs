//! OpenAI Responses API provider.

use super::provider::{Generation, LlmProvider, TokenUsage};
use crate::config::DesgenConfig;
use crate::errors::{ConfigurationError, ProviderError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Provider that calls `POST {base_url}/responses`.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiProvider {
    /// Creates a provider from validated settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the credential is missing, a setting is
    /// invalid, or the HTTP client cannot be built.
    pub fn from_config(config: &DesgenConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let api_key = config.require_api_key()?.to_string();

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ConfigurationError::new(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model_name.clone(),
        })
    }

    /// Returns the model name sent with each request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/responses", self.base_url)
    }
}

/// Request body for `/responses`.
#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Response body from `/responses`.
#[derive(Debug, Default, Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    usage: Option<UsageBody>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageBody {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
    #[serde(default)]
    total_tokens: Option<u64>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl ResponsesBody {
    fn into_generation(self) -> Generation {
        let text = self.output_text.unwrap_or_else(|| {
            self.output
                .iter()
                .flat_map(|item| &item.content)
                .filter(|part| part.kind == "output_text")
                .filter_map(|part| part.text.as_deref())
                .collect()
        });

        let usage = self.usage.map(|u| TokenUsage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
            total_tokens: u
                .total_tokens
                .unwrap_or(u.input_tokens.saturating_add(u.output_tokens)),
        });

        Generation { text, usage }
    }
}

/// Extracts `error.message` from an error body, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(&self, prompt: &str) -> Result<Generation, ProviderError> {
        let body = ResponsesRequest {
            model: &self.model,
            input: prompt,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::new(format!("Request timed out: {e}"))
                } else {
                    ProviderError::new(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            return Err(ProviderError::with_status(
                status.as_u16(),
                if message.is_empty() {
                    status.to_string()
                } else {
                    message
                },
            ));
        }

        let parsed: ResponsesBody = response
            .json()
            .await
            .map_err(|e| ProviderError::new(format!("Failed to parse provider response: {e}")))?;

        Ok(parsed.into_generation())
    }
}
