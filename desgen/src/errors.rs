//! Error types for the desgen pipeline.
//!
//! The core performs no recovery beyond the rate-limit retry inside the
//! invoker; every other failure propagates unchanged to the front door,
//! which decides how to present it.

use std::collections::HashMap;
use thiserror::Error;

/// HTTP status code used by providers to signal rate limiting.
pub const RATE_LIMIT_STATUS: u16 = 429;

/// The main error type for desgen operations.
#[derive(Debug, Error)]
pub enum DesgenError {
    /// Required configuration is missing or invalid.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// The provider call failed.
    #[error("{0}")]
    Provider(#[from] ProviderError),

    /// A stage's required input was absent or empty.
    #[error("{0}")]
    MissingInput(#[from] MissingInputError),

    /// A stage tried to write a key that already exists.
    #[error("{0}")]
    DataConflict(#[from] DataConflictError),

    /// The retry loop ended without a result or an error to report.
    #[error("LLM call failed after {attempts} attempts")]
    ExhaustedRetries {
        /// Number of attempts made.
        attempts: u32,
    },
}

impl DesgenError {
    /// Returns a stable machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION",
            Self::Provider(err) if err.is_rate_limited() => "RATE_LIMITED",
            Self::Provider(_) => "PROVIDER",
            Self::MissingInput(_) => "MISSING_INPUT",
            Self::DataConflict(_) => "DATA_CONFLICT",
            Self::ExhaustedRetries { .. } => "EXHAUSTED_RETRIES",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = match self {
            Self::Configuration(err) => err.to_dict(),
            Self::Provider(err) => err.to_dict(),
            Self::MissingInput(err) => err.to_dict(),
            Self::DataConflict(err) => {
                let mut map = HashMap::new();
                map.insert("key".to_string(), serde_json::json!(err.key));
                map
            }
            Self::ExhaustedRetries { attempts } => {
                let mut map = HashMap::new();
                map.insert("attempts".to_string(), serde_json::json!(attempts));
                map
            }
        };
        map.insert("code".to_string(), serde_json::json!(self.code()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = DesgenError> = std::result::Result<T, E>;

/// Error raised when configuration is missing or invalid.
#[derive(Debug, Clone, Error)]
#[error("Configuration error: {message}")]
pub struct ConfigurationError {
    /// The error message.
    pub message: String,
    /// The setting involved, if known.
    pub setting: Option<String>,
}

impl ConfigurationError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            setting: None,
        }
    }

    /// Sets the setting name.
    #[must_use]
    pub fn with_setting(mut self, setting: impl Into<String>) -> Self {
        self.setting = Some(setting.into());
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("message".to_string(), serde_json::json!(self.message));
        if let Some(ref setting) = self.setting {
            map.insert("setting".to_string(), serde_json::json!(setting));
        }
        map
    }
}

/// Error returned by an LLM provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Provider error{}: {message}", status_code.map(|c| format!(" ({c})")).unwrap_or_default())]
pub struct ProviderError {
    /// HTTP-style status code, when the provider returned one.
    pub status_code: Option<u16>,
    /// The error message.
    pub message: String,
}

impl ProviderError {
    /// Creates a provider error without a status code.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            message: message.into(),
        }
    }

    /// Creates a provider error with a status code.
    #[must_use]
    pub fn with_status(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code: Some(status_code),
            message: message.into(),
        }
    }

    /// Creates a 429 rate-limit error.
    #[must_use]
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::with_status(RATE_LIMIT_STATUS, message)
    }

    /// Returns true if this error signals rate limiting.
    ///
    /// A 429 status or a message mentioning "rate limit" in any case both count.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.status_code == Some(RATE_LIMIT_STATUS)
            || self.message.to_lowercase().contains("rate limit")
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("message".to_string(), serde_json::json!(self.message));
        map.insert("status_code".to_string(), serde_json::json!(self.status_code));
        map.insert("rate_limited".to_string(), serde_json::json!(self.is_rate_limited()));
        map
    }
}

/// Error raised when a stage's input is absent or empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Stage '{stage}' is missing required input: {}", keys.join(" | "))]
pub struct MissingInputError {
    /// The stage label.
    pub stage: String,
    /// The context keys that were consulted.
    pub keys: Vec<String>,
}

impl MissingInputError {
    /// Creates a new missing input error.
    #[must_use]
    pub fn new(stage: impl Into<String>, keys: &[&str]) -> Self {
        Self {
            stage: stage.into(),
            keys: keys.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("stage".to_string(), serde_json::json!(self.stage));
        map.insert("keys".to_string(), serde_json::json!(self.keys));
        map
    }
}

/// Error raised when writing to an existing key in a design context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Data conflict: key '{key}' already exists")]
pub struct DataConflictError {
    /// The conflicting key.
    pub key: String,
}

impl DataConflictError {
    /// Creates a new data conflict error.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}
