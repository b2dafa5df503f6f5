//! Fallback provider: a generative model emulating the NLU analysis.
//!
//! The model reply is untrusted. It is parsed into a default-filled
//! intermediate structure where every field is optional and every number
//! may arrive as a string; anything unusable becomes the neutral analysis.
//! Transport failures are still returned as errors.

use async_trait::async_trait;
use contentiq_core::{
    truncate_chars, CategoryResult, ContentAnalysis, EmotionResult, KeywordResult, SentimentLabel,
    SentimentResult,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;

use super::{
    AnalysisProvider, ChatMessage, CompletionConfig, LlmProvider, ProviderError, ProviderOutput,
};
use crate::prompts::{analysis_prompt, FALLBACK_SYSTEM_PROMPT};

pub const PROVIDER_NAME: &str = "granite-fallback";

/// Default prompt text limit, in characters.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 4000;

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)```").unwrap();
}

/// Analyzer that prompts an [`LlmProvider`] once per text.
pub struct FallbackAnalyzer {
    llm: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
    max_input_chars: usize,
}

impl FallbackAnalyzer {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            completion: CompletionConfig::default(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    pub fn with_completion_config(mut self, completion: CompletionConfig) -> Self {
        self.completion = completion;
        self
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    /// Prompt the model and parse its reply.
    ///
    /// Only transport and configuration problems are errors. An unusable
    /// reply yields [`ContentAnalysis::neutral`].
    pub async fn call_fallback(&self, text: &str) -> Result<ProviderOutput, ProviderError> {
        let content = truncate_chars(text, self.max_input_chars);
        let messages = vec![
            ChatMessage::system(FALLBACK_SYSTEM_PROMPT),
            ChatMessage::user(analysis_prompt(content)),
        ];

        let response = self.llm.complete(messages, &self.completion).await?;

        let analysis = match parse_reply(&response.content) {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(
                    provider = PROVIDER_NAME,
                    error = %e,
                    "Unparseable model reply, using neutral analysis"
                );
                ContentAnalysis::neutral()
            }
        };

        Ok(ProviderOutput {
            analysis,
            usage: Some(response.usage),
        })
    }
}

#[async_trait]
impl AnalysisProvider for FallbackAnalyzer {
    async fn analyze(&self, text: &str) -> Result<ContentAnalysis, ProviderError> {
        Ok(self.call_fallback(text).await?.analysis)
    }

    async fn analyze_detailed(&self, text: &str) -> Result<ProviderOutput, ProviderError> {
        self.call_fallback(text).await
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn is_configured(&self) -> bool {
        self.llm.is_configured()
    }
}

/// Locate the JSON object in a model reply.
///
/// Handles code fences and prose around the object. A fence without an
/// object in it does not hide one elsewhere in the reply.
pub fn extract_json(reply: &str) -> Option<&str> {
    let trimmed = reply.trim();
    CODE_FENCE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .and_then(|m| object_span(m.as_str()))
        .or_else(|| object_span(trimmed))
}

fn object_span(body: &str) -> Option<&str> {
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (end > start).then(|| &body[start..=end])
}

/// Parse a model reply into a base analysis.
///
/// Brand alignment stays at 0, readability at the neutral default and
/// suggestions empty; the orchestrator recomputes all three.
pub fn parse_reply(reply: &str) -> Result<ContentAnalysis, ProviderError> {
    let json = extract_json(reply)
        .ok_or_else(|| ProviderError::ParseError("no JSON object in model reply".to_string()))?;

    let raw: RawAnalysis = serde_json::from_str(json)
        .map_err(|e| ProviderError::ParseError(format!("model reply: {}", e)))?;

    Ok(raw.into_analysis())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAnalysis {
    #[serde(deserialize_with = "lenient")]
    sentiment: Option<RawSentiment>,
    #[serde(deserialize_with = "lenient")]
    emotions: Option<RawEmotions>,
    #[serde(deserialize_with = "lenient_vec")]
    keywords: Vec<RawKeyword>,
    #[serde(deserialize_with = "lenient_vec")]
    categories: Vec<RawCategory>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSentiment {
    Full {
        #[serde(default)]
        label: Option<String>,
        #[serde(default, deserialize_with = "lenient_f64")]
        score: f64,
    },
    Label(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEmotions {
    #[serde(deserialize_with = "lenient_f64")]
    joy: f64,
    #[serde(deserialize_with = "lenient_f64")]
    anger: f64,
    #[serde(deserialize_with = "lenient_f64")]
    disgust: f64,
    #[serde(deserialize_with = "lenient_f64")]
    sadness: f64,
    #[serde(deserialize_with = "lenient_f64")]
    fear: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawKeyword {
    Full {
        text: String,
        #[serde(default, deserialize_with = "lenient_f64")]
        relevance: f64,
    },
    Bare(String),
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    label: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    score: f64,
}

impl RawAnalysis {
    fn into_analysis(self) -> ContentAnalysis {
        let sentiment = match self.sentiment {
            Some(RawSentiment::Full { label, score }) => SentimentResult::new(
                label
                    .as_deref()
                    .map(SentimentLabel::from_label)
                    .unwrap_or_default(),
                score,
            ),
            Some(RawSentiment::Label(label)) => {
                SentimentResult::new(SentimentLabel::from_label(&label), 0.0)
            }
            None => SentimentResult::neutral(),
        };

        let emotions = self
            .emotions
            .map(|e| EmotionResult {
                joy: e.joy,
                anger: e.anger,
                disgust: e.disgust,
                sadness: e.sadness,
                fear: e.fear,
            })
            .unwrap_or_default();

        let keywords = self
            .keywords
            .into_iter()
            .map(|k| match k {
                RawKeyword::Full { text, relevance } => KeywordResult::new(text, relevance),
                RawKeyword::Bare(text) => KeywordResult::new(text, 0.0),
            })
            .filter(|k| !k.text.trim().is_empty())
            .collect();

        let categories = self
            .categories
            .into_iter()
            .filter(|c| !c.label.trim().is_empty())
            .map(|c| CategoryResult::new(c.label, c.score))
            .collect();

        let mut analysis = ContentAnalysis {
            sentiment,
            emotions,
            keywords,
            categories,
            ..ContentAnalysis::neutral()
        };
        analysis.normalize();
        analysis
    }
}

/// Deserialize `T`, or `None` when the value has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Deserialize an array, dropping elements with the wrong shape.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Numbers, numeric strings, or 0.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}
