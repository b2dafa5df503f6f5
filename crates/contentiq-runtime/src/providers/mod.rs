//! Provider abstractions for contentiq-runtime.
//!
//! Two seams live here:
//! - [`AnalysisProvider`]: something that turns text into a base
//!   [`ContentAnalysis`]. The orchestrator tries the primary implementation
//!   and falls back to the second.
//! - [`LlmProvider`]: a text-generation backend used by the fallback analyzer.
//!
//! ## Security
//!
//! All providers use the [`secrets`] module for credential handling and the
//! shared [`TokenCache`] for bearer tokens.

use async_trait::async_trait;
use contentiq_core::ContentAnalysis;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub mod fallback;
mod http;
pub mod nlu;
pub mod secrets;
pub mod token;
pub mod watsonx;

pub use fallback::FallbackAnalyzer;
pub use http::build_client;
pub use nlu::{NluClient, NluResponse};
pub use secrets::{ApiCredential, CredentialSource};
pub use token::{BearerToken, CachedToken, TokenCache};
pub use watsonx::WatsonxGenerator;

/// Errors from providers.
///
/// `NotConfigured` and `AuthError` are deployment problems; the rest are
/// runtime failures of a single call.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Authentication failed: {status} - {message}")]
    AuthError { status: u16, message: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Rate limit exceeded, retry after {retry_after:?}: {message}")]
    RateLimited {
        retry_after: Option<Duration>,
        message: String,
    },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Circuit open for provider '{0}'")]
    CircuitOpen(String),
}

impl ProviderError {
    /// True for errors the caller must fix in the deployment configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::NotConfigured(_) | Self::AuthError { .. })
    }
}

/// Decoding parameters for a text-generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Model identifier
    pub model: String,

    /// Maximum tokens to generate
    pub max_new_tokens: u32,

    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub repetition_penalty: f32,

    /// Sequences that end generation
    pub stop_sequences: Vec<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "ibm/granite-3.1-8b-instruct".to_string(),
            max_new_tokens: 4096,
            temperature: 0.7,
            top_p: 0.9,
            top_k: 50,
            repetition_penalty: 1.1,
            stop_sequences: vec!["<|endoftext|>".to_string(), "<|user|>".to_string()],
        }
    }
}

/// A chat message for LLM completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system" or "user"
    pub role: String,

    /// Message content
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Response from an LLM completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content
    pub content: String,

    /// Token usage
    pub usage: TokenUsage,

    /// Stop reason
    pub stop_reason: Option<String>,
}

/// Token usage from a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,

    /// Tokens in the completion
    pub completion_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used.
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A text-generation backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a chat completion.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Whether credentials and endpoint are present.
    fn is_configured(&self) -> bool;

    /// Get provider name for logs.
    fn name(&self) -> &str;
}

/// A base analysis plus what it cost to produce.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderOutput {
    pub analysis: ContentAnalysis,

    /// Token usage, for providers that bill by token
    pub usage: Option<TokenUsage>,
}

/// A source of base analyses.
///
/// Implementations return the provider's view of sentiment, emotions,
/// keywords and categories. Brand alignment, readability and suggestions
/// are recomputed by the orchestrator regardless of what is returned here.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Analyze `text`. Implementations truncate to their own safe length.
    async fn analyze(&self, text: &str) -> Result<ContentAnalysis, ProviderError>;

    /// Like [`analyze`](Self::analyze), also reporting token usage.
    async fn analyze_detailed(&self, text: &str) -> Result<ProviderOutput, ProviderError> {
        Ok(ProviderOutput {
            analysis: self.analyze(text).await?,
            usage: None,
        })
    }

    /// Provider name, also the circuit breaker key.
    fn name(&self) -> &str;

    /// Whether the provider has the endpoint it needs.
    fn is_configured(&self) -> bool {
        true
    }
}
