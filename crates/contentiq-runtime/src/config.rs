//! Runtime configuration.
//!
//! Every field has a default, so an empty YAML document is a valid
//! configuration. Environment variables override file values; see
//! [`RuntimeConfig::with_env_overrides`].

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::providers::token::DEFAULT_IDENTITY_URL;
use crate::resilience::CircuitBreakerConfig;

pub const ENV_API_KEY: &str = "WATSONX_API_KEY";
pub const ENV_NLU_URL: &str = "WATSON_NLU_URL";
pub const ENV_GENERATION_URL: &str = "WATSONX_URL";
pub const ENV_PROJECT_ID: &str = "WATSONX_PROJECT_ID";
pub const ENV_IDENTITY_URL: &str = "WATSONX_IAM_URL";
pub const ENV_REQUEST_TIMEOUT: &str = "CONTENTIQ_REQUEST_TIMEOUT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid duration in {key}: {message}")]
    InvalidDuration { key: String, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level runtime configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// IBM Cloud API key. Falls back to `WATSONX_API_KEY` when absent.
    #[serde(deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,

    /// Identity (token exchange) endpoint
    pub identity_url: String,

    /// Per-request HTTP timeout, e.g. `"30s"`
    #[serde(deserialize_with = "deserialize_duration")]
    pub request_timeout: Duration,

    /// Upper bound on one provider call, token exchange included
    #[serde(deserialize_with = "deserialize_duration")]
    pub provider_timeout: Duration,

    pub nlu: NluConfig,
    pub generation: GenerationConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            provider_timeout: Duration::from_secs(60),
            nlu: NluConfig::default(),
            generation: GenerationConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`. Blank values are ignored.
    ///
    /// The API key is not read here; it is resolved when the providers
    /// are built so that it stays in the credential wrapper.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_NLU_URL) {
            self.nlu.url = Some(url);
        }
        if let Some(url) = get(ENV_GENERATION_URL) {
            self.generation.base_url = url;
        }
        if let Some(project) = get(ENV_PROJECT_ID) {
            self.generation.project_id = Some(project);
        }
        if let Some(url) = get(ENV_IDENTITY_URL) {
            self.identity_url = url;
        }
        if let Some(raw) = get(ENV_REQUEST_TIMEOUT) {
            self.request_timeout =
                humantime::parse_duration(raw.trim()).map_err(|e| ConfigError::InvalidDuration {
                    key: ENV_REQUEST_TIMEOUT.to_string(),
                    message: e.to_string(),
                })?;
        }

        Ok(self)
    }

    /// Reject values that would make every call fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid("request_timeout must be positive".into()));
        }
        if self.provider_timeout.is_zero() {
            return Err(ConfigError::Invalid("provider_timeout must be positive".into()));
        }
        if self.generation.max_input_chars == 0 {
            return Err(ConfigError::Invalid(
                "generation.max_input_chars must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Primary NLU provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NluConfig {
    /// Service base URL. `None` means the primary is not configured.
    pub url: Option<String>,

    /// API version date sent as `?version=`
    pub version: String,

    pub language: String,
    pub keyword_limit: u32,
    pub category_limit: u32,

    /// Longest text sent to the service, in characters
    pub max_text_chars: usize,
}

impl Default for NluConfig {
    fn default() -> Self {
        Self {
            url: None,
            version: "2022-04-07".to_string(),
            language: "pt".to_string(),
            keyword_limit: 15,
            category_limit: 5,
            max_text_chars: 50_000,
        }
    }
}

/// Fallback text-generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub project_id: Option<String>,

    /// API version date sent as `?version=`
    pub version: String,

    /// Longest text embedded in the analysis prompt, in characters
    pub max_input_chars: usize,

    pub model: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub repetition_penalty: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://us-south.ml.cloud.ibm.com".to_string(),
            project_id: None,
            version: "2024-05-31".to_string(),
            max_input_chars: 4000,
            model: "ibm/granite-3.1-8b-instruct".to_string(),
            max_new_tokens: 4096,
            temperature: 0.7,
            top_p: 0.9,
            top_k: 50,
            repetition_penalty: 1.1,
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
}
