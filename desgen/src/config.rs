//! Process-wide settings for the design pipeline.
//!
//! The configuration is built once at startup and handed to the invoker and
//! the orchestrator; nothing below this module reads the environment.

use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Environment variable holding the model name.
pub const ENV_MODEL_NAME: &str = "MODEL_NAME";
/// Environment variable holding the attempt budget.
pub const ENV_MAX_RETRIES: &str = "MAX_RETRIES";
/// Environment variable holding the backoff base delay in seconds.
pub const ENV_BASE_DELAY_SECONDS: &str = "BASE_DELAY_SECONDS";
/// Environment variable holding the minimum inter-call interval in seconds.
pub const ENV_THROTTLE_SECONDS: &str = "THROTTLE_SECONDS";
/// Environment variable toggling usage logging (`1` enables).
pub const ENV_LOG_USAGE: &str = "LOG_USAGE";
/// Primary credential variable.
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Fallback credential variable.
pub const ENV_API_KEY: &str = "API_KEY";
/// Environment variable overriding the provider base URL.
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
/// Environment variable holding the per-request timeout in seconds.
pub const ENV_REQUEST_TIMEOUT_SECONDS: &str = "REQUEST_TIMEOUT_SECONDS";
/// Environment variable holding the allowed CORS origin.
pub const ENV_FRONTEND_ORIGIN: &str = "FRONTEND_ORIGIN";

/// Upper bound, in seconds, for every delay and timeout setting (one day).
pub const MAX_SECONDS: f64 = 86_400.0;

/// Settings shared by the invoker, the provider adapter and the front doors.
#[derive(Clone, Serialize, Deserialize)]
pub struct DesgenConfig {
    /// Model identifier sent to the provider.
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Maximum attempts per provider call, including the first.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay for exponential backoff, in seconds.
    #[serde(default = "default_base_delay")]
    pub base_delay_seconds: f64,
    /// Minimum interval between provider calls, in seconds. Zero disables throttling.
    #[serde(default)]
    pub throttle_seconds: f64,
    /// Whether to log token usage after each successful call.
    #[serde(default)]
    pub log_usage: bool,
    /// Provider credential.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Provider base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: f64,
    /// Origin allowed by the HTTP front door's CORS policy.
    #[serde(default = "default_frontend_origin")]
    pub frontend_origin: String,
}

fn default_model_name() -> String {
    "gpt-5-nano".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay() -> f64 {
    2.0
}

fn default_api_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_request_timeout() -> f64 {
    120.0
}

fn default_frontend_origin() -> String {
    "http://localhost:5173".to_string()
}

impl Default for DesgenConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            max_retries: default_max_retries(),
            base_delay_seconds: default_base_delay(),
            throttle_seconds: 0.0,
            log_usage: false,
            api_key: None,
            api_base_url: default_api_base_url(),
            request_timeout_seconds: default_request_timeout(),
            frontend_origin: default_frontend_origin(),
        }
    }
}

impl std::fmt::Debug for DesgenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesgenConfig")
            .field("model_name", &self.model_name)
            .field("max_retries", &self.max_retries)
            .field("base_delay_seconds", &self.base_delay_seconds)
            .field("throttle_seconds", &self.throttle_seconds)
            .field("log_usage", &self.log_usage)
            .field("has_api_key", &self.api_key.is_some())
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("frontend_origin", &self.frontend_origin)
            .finish()
    }
}

impl DesgenConfig {
    /// Creates a configuration with defaults and no credential.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_vars(std::env::vars())
    }

    /// Reads the configuration from arbitrary key/value pairs.
    ///
    /// Unset variables keep their defaults. Values that fail to parse are
    /// reported with the variable name.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let lookup = |name: &str| vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

        let mut config = Self::default();

        if let Some(model) = lookup(ENV_MODEL_NAME) {
            config.model_name = model.to_string();
        }
        if let Some(raw) = lookup(ENV_MAX_RETRIES) {
            config.max_retries = parse_setting(ENV_MAX_RETRIES, raw)?;
        }
        if let Some(raw) = lookup(ENV_BASE_DELAY_SECONDS) {
            config.base_delay_seconds = parse_setting(ENV_BASE_DELAY_SECONDS, raw)?;
        }
        if let Some(raw) = lookup(ENV_THROTTLE_SECONDS) {
            config.throttle_seconds = parse_setting(ENV_THROTTLE_SECONDS, raw)?;
        }
        if let Some(raw) = lookup(ENV_LOG_USAGE) {
            config.log_usage = raw == "1";
        }
        config.api_key = lookup(ENV_OPENAI_API_KEY)
            .or_else(|| lookup(ENV_API_KEY))
            .map(str::to_string);
        if let Some(url) = lookup(ENV_OPENAI_BASE_URL) {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_SECONDS) {
            config.request_timeout_seconds = parse_setting(ENV_REQUEST_TIMEOUT_SECONDS, raw)?;
        }
        if let Some(origin) = lookup(ENV_FRONTEND_ORIGIN) {
            config.frontend_origin = origin.to_string();
        }

        Ok(config)
    }

    /// Sets the model name.
    #[must_use]
    pub fn with_model_name(mut self, model: impl Into<String>) -> Self {
        self.model_name = model.into();
        self
    }

    /// Sets the attempt budget.
    #[must_use]
    pub fn with_max_retries(mut self, attempts: u32) -> Self {
        self.max_retries = attempts;
        self
    }

    /// Sets the backoff base delay.
    #[must_use]
    pub fn with_base_delay_seconds(mut self, seconds: f64) -> Self {
        self.base_delay_seconds = seconds;
        self
    }

    /// Sets the throttle interval.
    #[must_use]
    pub fn with_throttle_seconds(mut self, seconds: f64) -> Self {
        self.throttle_seconds = seconds;
        self
    }

    /// Enables or disables usage logging.
    #[must_use]
    pub fn with_log_usage(mut self, enabled: bool) -> Self {
        self.log_usage = enabled;
        self
    }

    /// Sets the provider credential.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the provider base URL.
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Checks the settings the invoker and provider depend on.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the credential is missing, the attempt
    /// budget is zero, or a duration is negative, not finite, or above
    /// [`MAX_SECONDS`].
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.validate_timing()?;
        self.require_api_key()?;
        Ok(())
    }

    /// Checks the retry and throttle settings only.
    ///
    /// Used where no credential is needed, e.g. an invoker wrapping a local
    /// provider.
    pub fn validate_timing(&self) -> Result<(), ConfigurationError> {
        if self.max_retries == 0 {
            return Err(ConfigurationError::new("MAX_RETRIES must be at least 1")
                .with_setting(ENV_MAX_RETRIES));
        }
        check_seconds(ENV_BASE_DELAY_SECONDS, self.base_delay_seconds)?;
        check_seconds(ENV_THROTTLE_SECONDS, self.throttle_seconds)?;
        check_seconds(ENV_REQUEST_TIMEOUT_SECONDS, self.request_timeout_seconds)?;
        Ok(())
    }

    /// Returns the credential, or an error naming the variables to set.
    pub fn require_api_key(&self) -> Result<&str, ConfigurationError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ConfigurationError::new(
                    "Missing OPENAI_API_KEY. Set it in the environment or pass it with docker run -e OPENAI_API_KEY=...",
                )
                .with_setting(ENV_OPENAI_API_KEY)
            })
    }

    /// Backoff base delay as a `Duration`.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        seconds_to_duration(self.base_delay_seconds)
    }

    /// Throttle interval, or `None` when throttling is disabled.
    #[must_use]
    pub fn throttle_interval(&self) -> Option<Duration> {
        (self.throttle_seconds > 0.0).then(|| seconds_to_duration(self.throttle_seconds))
    }

    /// Per-request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        seconds_to_duration(self.request_timeout_seconds)
    }
}

fn parse_setting<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigurationError> {
    raw.parse().map_err(|_| {
        ConfigurationError::new(format!("{name} has an invalid value: '{raw}'")).with_setting(name)
    })
}

fn check_seconds(name: &str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && (0.0..=MAX_SECONDS).contains(&value) {
        Ok(())
    } else {
        Err(ConfigurationError::new(format!(
            "{name} must be between 0 and {MAX_SECONDS} seconds, got {value}"
        ))
        .with_setting(name))
    }
}

/// Converts unvalidated seconds, clamping into `[0, MAX_SECONDS]`.
fn seconds_to_duration(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.clamp(0.0, MAX_SECONDS)).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = DesgenConfig::from_vars(Vec::<(String, String)>::new()).unwrap();

        assert_eq!(config.model_name, "gpt-5-nano");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay(), Duration::from_secs(2));
        assert_eq!(config.throttle_interval(), None);
        assert!(!config.log_usage);
        assert!(config.api_key.is_none());
        assert_eq!(config.frontend_origin, "http://localhost:5173");
    }

    #[test]
    fn test_from_vars_overrides() {
        let config = DesgenConfig::from_vars([
            ("MODEL_NAME", "gpt-4o-mini"),
            ("MAX_RETRIES", "5"),
            ("BASE_DELAY_SECONDS", "0.5"),
            ("THROTTLE_SECONDS", "1"),
            ("LOG_USAGE", "1"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:9999/v1/"),
        ])
        .unwrap();

        assert_eq!(config.model_name, "gpt-4o-mini");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.base_delay(), Duration::from_millis(500));
        assert_eq!(config.throttle_interval(), Some(Duration::from_secs(1)));
        assert!(config.log_usage);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.api_base_url, "http://localhost:9999/v1");
    }

    #[test]
    fn test_log_usage_only_enabled_by_one() {
        let config = DesgenConfig::from_vars([("LOG_USAGE", "true")]).unwrap();
        assert!(!config.log_usage);
    }

    #[test]
    fn test_api_key_fallback() {
        let config = DesgenConfig::from_vars([("API_KEY", "fallback")]).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("fallback"));

        let config =
            DesgenConfig::from_vars([("API_KEY", "fallback"), ("OPENAI_API_KEY", "primary")])
                .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_invalid_number_names_variable() {
        let err = DesgenConfig::from_vars([("MAX_RETRIES", "three")]).unwrap_err();
        assert_eq!(err.setting.as_deref(), Some("MAX_RETRIES"));
        assert!(err.message.contains("three"));
    }

    #[test]
    fn test_validate_requires_api_key() {
        let err = DesgenConfig::new().validate().unwrap_err();
        assert_eq!(err.setting.as_deref(), Some("OPENAI_API_KEY"));

        let err = DesgenConfig::new().with_api_key("  ").validate().unwrap_err();
        assert_eq!(err.setting.as_deref(), Some("OPENAI_API_KEY"));

        assert!(DesgenConfig::new().with_api_key("sk-test").validate().is_ok());
    }

    #[test]
    fn test_validate_timing() {
        assert!(DesgenConfig::new().with_max_retries(0).validate_timing().is_err());
        assert!(DesgenConfig::new().with_base_delay_seconds(-1.0).validate_timing().is_err());
        assert!(DesgenConfig::new().with_throttle_seconds(f64::NAN).validate_timing().is_err());
        assert!(DesgenConfig::new().with_base_delay_seconds(0.0).validate_timing().is_ok());
    }

    #[test]
    fn test_oversized_durations_are_rejected() {
        for name in ["BASE_DELAY_SECONDS", "THROTTLE_SECONDS", "REQUEST_TIMEOUT_SECONDS"] {
            let config = DesgenConfig::from_vars([(name, "1e30"), ("OPENAI_API_KEY", "k")]).unwrap();
            let err = config.validate().unwrap_err();
            assert_eq!(err.setting.as_deref(), Some(name));
        }
        assert!(DesgenConfig::new()
            .with_throttle_seconds(MAX_SECONDS)
            .validate_timing()
            .is_ok());
    }

    #[test]
    fn test_duration_getters_clamp_unvalidated_values() {
        let config = DesgenConfig::new()
            .with_base_delay_seconds(1e30)
            .with_throttle_seconds(f64::INFINITY);
        assert_eq!(config.base_delay(), Duration::from_secs(86_400));
        assert_eq!(config.throttle_interval(), Some(Duration::from_secs(86_400)));

        let config = DesgenConfig::new().with_base_delay_seconds(f64::NAN);
        assert_eq!(config.base_delay(), Duration::ZERO);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = DesgenConfig::new().with_api_key("sk-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("has_api_key: true"));
    }
}
