//! watsonx.ai text generation (Granite models).
//!
//! Chat messages are rendered into the Granite prompt template and sent to
//! `/ml/v1/text/generation`. Bearer tokens come from the shared
//! [`TokenCache`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::http::{check_status, send_error};
use super::token::TokenCache;
use super::{ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, TokenUsage};
use crate::config::GenerationConfig;

pub const PROVIDER_NAME: &str = "watsonx-granite";

/// Text-generation client for watsonx.ai.
pub struct WatsonxGenerator {
    client: reqwest::Client,
    tokens: Arc<TokenCache>,
    base_url: String,
    version: String,
    project_id: Option<String>,
}

impl std::fmt::Debug for WatsonxGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatsonxGenerator")
            .field("base_url", &self.base_url)
            .field("version", &self.version)
            .field("project_id", &self.project_id)
            .finish()
    }
}

impl WatsonxGenerator {
    pub fn new(client: reqwest::Client, tokens: Arc<TokenCache>, config: &GenerationConfig) -> Self {
        Self {
            client,
            tokens,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            version: config.version.clone(),
            project_id: config.project_id.clone().filter(|p| !p.trim().is_empty()),
        }
    }

    fn project_id(&self) -> Result<&str, ProviderError> {
        self.project_id
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("WATSONX_PROJECT_ID not configured".into()))
    }
}

/// Render chat messages into the Granite instruct template.
///
/// Each message becomes `<|role|>\n{content}\n`; the prompt ends with an
/// open assistant turn.
pub fn render_granite_prompt(messages: &[ChatMessage]) -> String {
    let mut prompt = String::new();
    for message in messages {
        prompt.push_str("<|");
        prompt.push_str(&message.role);
        prompt.push_str("|>\n");
        prompt.push_str(&message.content);
        prompt.push('\n');
    }
    prompt.push_str("<|assistant|>\n");
    prompt
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model_id: &'a str,
    input: String,
    parameters: GenerationParameters<'a>,
    project_id: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationParameters<'a> {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    repetition_penalty: f32,
    stop_sequences: &'a [String],
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    results: Vec<GenerationResult>,
}

#[derive(Debug, Deserialize)]
struct GenerationResult {
    #[serde(default)]
    generated_text: String,
    #[serde(default)]
    generated_token_count: u32,
    #[serde(default)]
    input_token_count: u32,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[async_trait]
impl LlmProvider for WatsonxGenerator {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let project_id = self.project_id()?;
        let token = self.tokens.get_token().await?;

        let request = GenerationRequest {
            model_id: &config.model,
            input: render_granite_prompt(&messages),
            parameters: GenerationParameters {
                max_new_tokens: config.max_new_tokens,
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
                repetition_penalty: config.repetition_penalty,
                stop_sequences: &config.stop_sequences,
            },
            project_id,
        };

        let url = format!("{}/ml/v1/text/generation?version={}", self.base_url, self.version);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token.expose())
            .json(&request)
            .send()
            .await
            .map_err(send_error)?;

        let response = check_status(response).await?;
        let body: GenerationResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("generation response: {}", e)))?;

        // An empty result list is an empty completion, not an error.
        let first = body.results.into_iter().next();
        let (content, usage, stop_reason) = match first {
            Some(result) => (
                result.generated_text.trim().to_string(),
                TokenUsage {
                    prompt_tokens: result.input_token_count,
                    completion_tokens: result.generated_token_count,
                },
                result.stop_reason,
            ),
            None => (String::new(), TokenUsage::default(), None),
        };

        tracing::debug!(
            provider = PROVIDER_NAME,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Generation completed"
        );

        Ok(CompletionResponse {
            content,
            usage,
            stop_reason,
        })
    }

    fn is_configured(&self) -> bool {
        self.project_id.is_some() && self.tokens.is_configured()
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::token::DEFAULT_IDENTITY_URL;

    #[test]
    fn test_granite_template() {
        let prompt = render_granite_prompt(&[
            ChatMessage::system("You are an analyst."),
            ChatMessage::user("Analyze this."),
        ]);

        assert_eq!(
            prompt,
            "<|system|>\nYou are an analyst.\n<|user|>\nAnalyze this.\n<|assistant|>\n"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let config = CompletionConfig::default();
        let request = GenerationRequest {
            model_id: &config.model,
            input: "prompt".to_string(),
            parameters: GenerationParameters {
                max_new_tokens: config.max_new_tokens,
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
                repetition_penalty: config.repetition_penalty,
                stop_sequences: &config.stop_sequences,
            },
            project_id: "proj-1",
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model_id"], "ibm/granite-3.1-8b-instruct");
        assert_eq!(json["project_id"], "proj-1");
        assert_eq!(json["parameters"]["max_new_tokens"], 4096);
        assert_eq!(json["parameters"]["top_k"], 50);
        assert_eq!(
            json["parameters"]["stop_sequences"],
            serde_json::json!(["<|endoftext|>", "<|user|>"])
        );
    }

    #[tokio::test]
    async fn test_missing_project_is_not_configured() {
        let client = reqwest::Client::new();
        let tokens = Arc::new(TokenCache::new(client.clone(), DEFAULT_IDENTITY_URL, None));
        let generator = WatsonxGenerator::new(client, tokens, &GenerationConfig::default());

        assert!(!generator.is_configured());
        let err = generator
            .complete(vec![ChatMessage::user("hi")], &CompletionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(ref m) if m.contains("PROJECT_ID")));
    }
}
