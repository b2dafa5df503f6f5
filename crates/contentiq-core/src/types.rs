//! Result types shared by every analysis path.
//!
//! Providers fill these in from whatever they return; the
//! [`Synthesizer`](crate::Synthesizer) clamps them into their documented
//! ranges before anything reaches a caller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of suggestions carried by a [`ContentAnalysis`].
pub const MAX_SUGGESTIONS: usize = 3;

/// Readability reported when nothing better is known.
pub const NEUTRAL_READABILITY: u8 = 50;

/// Polarity of a piece of text.
///
/// Deserializes leniently: any label other than `positive` or `negative`
/// (case-insensitive) becomes [`SentimentLabel::Neutral`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SentimentLabel {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl SentimentLabel {
    /// Parse a provider label.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            _ => Self::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl From<String> for SentimentLabel {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document or keyword sentiment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,

    /// Polarity score in `[-1.0, 1.0]`
    pub score: f64,
}

impl SentimentResult {
    pub fn new(label: SentimentLabel, score: f64) -> Self {
        Self { label, score }
    }

    pub fn neutral() -> Self {
        Self::default()
    }

    fn normalize(&mut self) {
        self.score = clamp_signed_unit(self.score);
    }
}

/// Emotion intensities, each independently in `[0, 1]`.
///
/// The five values are not mutually exclusive and do not sum to 1.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionResult {
    pub joy: f64,
    pub anger: f64,
    pub disgust: f64,
    pub sadness: f64,
    pub fear: f64,
}

impl EmotionResult {
    fn normalize(&mut self) {
        for value in [
            &mut self.joy,
            &mut self.anger,
            &mut self.disgust,
            &mut self.sadness,
            &mut self.fear,
        ] {
            *value = clamp_unit(*value);
        }
    }
}

/// An extracted keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordResult {
    pub text: String,

    /// Relevance in `[0, 1]`
    pub relevance: f64,

    /// Keyword-level sentiment, when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentResult>,
}

impl KeywordResult {
    pub fn new(text: impl Into<String>, relevance: f64) -> Self {
        Self {
            text: text.into(),
            relevance,
            sentiment: None,
        }
    }

    pub fn with_sentiment(mut self, sentiment: SentimentResult) -> Self {
        self.sentiment = Some(sentiment);
        self
    }
}

/// A topic category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub label: String,

    /// Confidence in `[0, 1]`
    pub score: f64,
}

impl CategoryResult {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// The aggregate returned to callers.
///
/// `brand_alignment_score` and `readability_score` are always computed
/// locally; whatever a provider put there is overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnalysis {
    pub sentiment: SentimentResult,
    pub emotions: EmotionResult,
    pub keywords: Vec<KeywordResult>,
    pub categories: Vec<CategoryResult>,

    /// Brand alignment, 0-100
    pub brand_alignment_score: u8,

    /// Readability, 0-100
    pub readability_score: u8,

    /// At most [`MAX_SUGGESTIONS`] short suggestions, in priority order
    pub suggestions: Vec<String>,
}

impl ContentAnalysis {
    /// The neutral analysis used when no provider produced anything usable.
    pub fn neutral() -> Self {
        Self {
            sentiment: SentimentResult::neutral(),
            emotions: EmotionResult::default(),
            keywords: Vec::new(),
            categories: Vec::new(),
            brand_alignment_score: 0,
            readability_score: NEUTRAL_READABILITY,
            suggestions: Vec::new(),
        }
    }

    /// Clamp every numeric field into its documented range.
    ///
    /// Non-finite values become 0. Keyword order is left untouched.
    pub fn normalize(&mut self) {
        self.sentiment.normalize();
        self.emotions.normalize();

        for keyword in &mut self.keywords {
            keyword.relevance = clamp_unit(keyword.relevance);
            if let Some(sentiment) = keyword.sentiment.as_mut() {
                sentiment.normalize();
            }
        }

        for category in &mut self.categories {
            category.score = clamp_unit(category.score);
        }

        self.brand_alignment_score = self.brand_alignment_score.min(100);
        self.readability_score = self.readability_score.min(100);
        self.suggestions.truncate(MAX_SUGGESTIONS);
    }

    /// Mean keyword relevance, 0 when there are no keywords.
    pub fn average_keyword_relevance(&self) -> f64 {
        average_relevance(&self.keywords)
    }
}

impl Default for ContentAnalysis {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Mean relevance over `keywords`, 0 for an empty slice.
pub fn average_relevance(keywords: &[KeywordResult]) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }
    let total: f64 = keywords.iter().map(|k| clamp_unit(k.relevance)).sum();
    total / keywords.len() as f64
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub(crate) fn clamp_signed_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
