//! Primary provider: IBM Watson Natural Language Understanding.
//!
//! [`NluClient::call_primary`] issues the raw request and returns the
//! service's native response. [`NluResponse::into_analysis`] maps it into
//! the internal model as a separate step.

use async_trait::async_trait;
use contentiq_core::{
    readability_score, truncate_chars, CategoryResult, ContentAnalysis, EmotionResult,
    KeywordResult, SentimentLabel, SentimentResult,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::http::{check_status, send_error};
use super::token::TokenCache;
use super::{AnalysisProvider, ProviderError};
use crate::config::NluConfig;

pub const PROVIDER_NAME: &str = "watson-nlu";

/// Client for the `/v1/analyze` endpoint.
pub struct NluClient {
    client: reqwest::Client,
    tokens: Arc<TokenCache>,
    config: NluConfig,
}

impl NluClient {
    pub fn new(client: reqwest::Client, tokens: Arc<TokenCache>, config: NluConfig) -> Self {
        Self {
            client,
            tokens,
            config,
        }
    }

    fn endpoint(&self) -> Result<String, ProviderError> {
        let base = self
            .config
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ProviderError::NotConfigured("WATSON_NLU_URL not configured".into()))?;

        Ok(format!(
            "{}/v1/analyze?version={}",
            base.trim_end_matches('/'),
            self.config.version
        ))
    }

    /// Send `text` to the service and return its response unmodified.
    pub async fn call_primary(&self, text: &str) -> Result<NluResponse, ProviderError> {
        let url = self.endpoint()?;
        let token = self.tokens.get_token().await?;

        let body = AnalyzeRequest {
            text: truncate_chars(text, self.config.max_text_chars),
            features: Features {
                sentiment: DocumentFeature { document: true },
                emotion: DocumentFeature { document: true },
                keywords: KeywordsFeature {
                    sentiment: true,
                    limit: self.config.keyword_limit,
                },
                categories: LimitFeature {
                    limit: self.config.category_limit,
                },
            },
            language: &self.config.language,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(token.expose())
            .json(&body)
            .send()
            .await
            .map_err(send_error)?;

        let response = check_status(response).await?;

        response
            .json::<NluResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("NLU response: {}", e)))
    }
}

#[async_trait]
impl AnalysisProvider for NluClient {
    async fn analyze(&self, text: &str) -> Result<ContentAnalysis, ProviderError> {
        let response = self.call_primary(text).await?;
        Ok(response.into_analysis(text))
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn is_configured(&self) -> bool {
        self.endpoint().is_ok()
    }
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
    features: Features,
    language: &'a str,
}

#[derive(Serialize)]
struct Features {
    sentiment: DocumentFeature,
    emotion: DocumentFeature,
    keywords: KeywordsFeature,
    categories: LimitFeature,
}

#[derive(Serialize)]
struct DocumentFeature {
    document: bool,
}

#[derive(Serialize)]
struct KeywordsFeature {
    sentiment: bool,
    limit: u32,
}

#[derive(Serialize)]
struct LimitFeature {
    limit: u32,
}

/// Native `/v1/analyze` response.
///
/// Every section is optional; the service omits features it could not
/// compute for the given text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NluResponse {
    pub sentiment: Option<NluSentiment>,
    pub emotion: Option<NluEmotion>,
    pub keywords: Vec<NluKeyword>,
    pub categories: Vec<NluCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NluSentiment {
    pub document: NluLabelScore,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NluLabelScore {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NluEmotion {
    pub document: NluEmotionDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NluEmotionDocument {
    pub emotion: NluEmotionScores,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NluEmotionScores {
    pub joy: f64,
    pub anger: f64,
    pub disgust: f64,
    pub sadness: f64,
    pub fear: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NluKeyword {
    pub text: String,
    #[serde(default)]
    pub relevance: f64,
    #[serde(default)]
    pub sentiment: Option<NluLabelScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NluCategory {
    pub label: String,
    #[serde(default)]
    pub score: f64,
}

impl NluLabelScore {
    fn into_sentiment(self) -> SentimentResult {
        SentimentResult::new(SentimentLabel::from_label(&self.label), self.score)
    }
}

impl NluResponse {
    /// Map into the internal model.
    ///
    /// Keyword order is kept as returned. Brand alignment is left at 0 and
    /// readability is a provisional local value; both are recomputed later.
    pub fn into_analysis(self, text: &str) -> ContentAnalysis {
        let sentiment = self
            .sentiment
            .map(|s| s.document.into_sentiment())
            .unwrap_or_else(SentimentResult::neutral);

        let emotions = self
            .emotion
            .map(|e| {
                let scores = e.document.emotion;
                EmotionResult {
                    joy: scores.joy,
                    anger: scores.anger,
                    disgust: scores.disgust,
                    sadness: scores.sadness,
                    fear: scores.fear,
                }
            })
            .unwrap_or_default();

        let keywords = self
            .keywords
            .into_iter()
            .map(|k| {
                let keyword = KeywordResult::new(k.text, k.relevance);
                match k.sentiment {
                    Some(s) => keyword.with_sentiment(s.into_sentiment()),
                    None => keyword,
                }
            })
            .collect();

        let categories = self
            .categories
            .into_iter()
            .map(|c| CategoryResult::new(c.label, c.score))
            .collect();

        ContentAnalysis {
            sentiment,
            emotions,
            keywords,
            categories,
            brand_alignment_score: 0,
            readability_score: readability_score(text),
            suggestions: Vec::new(),
        }
    }
}
