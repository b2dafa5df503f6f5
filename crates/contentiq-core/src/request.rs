//! Analysis requests and brand context.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Content is required: text is empty")]
    EmptyText,
}

/// Brand guidelines used for alignment scoring.
///
/// Accepts both snake_case (brand files) and camelCase (JSON callers) keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandContext {
    /// Free-form description of the brand voice
    #[serde(default, alias = "brandVoice")]
    pub brand_voice: Option<String>,

    /// Words that must not appear in the content
    #[serde(default, alias = "forbiddenWords")]
    pub forbidden_words: Vec<String>,

    /// Elements the content is expected to mention
    #[serde(default, alias = "mandatoryElements")]
    pub mandatory_elements: Vec<String>,
}

impl BrandContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_brand_voice(mut self, voice: impl Into<String>) -> Self {
        self.brand_voice = Some(voice.into());
        self
    }

    /// Set forbidden words. Entries are trimmed and blank ones dropped.
    pub fn with_forbidden_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.forbidden_words = clean_list(words);
        self
    }

    /// Set mandatory elements. Entries are trimmed and blank ones dropped.
    pub fn with_mandatory_elements<I, S>(mut self, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.mandatory_elements = clean_list(elements);
        self
    }

    /// True when the context carries no scoring rules at all.
    pub fn is_empty(&self) -> bool {
        self.brand_voice.is_none()
            && self.forbidden_words.is_empty()
            && self.mandatory_elements.is_empty()
    }
}

/// Split a comma-separated list, trimming entries and dropping blanks.
pub fn parse_list(csv: &str) -> Vec<String> {
    clean_list(csv.split(','))
}

fn clean_list<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A validated analysis request.
///
/// The text is never empty. Providers receive a truncated view of it via
/// [`AnalysisRequest::truncated_text`]; local scoring always sees the full text.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    text: String,
    brand_context: Option<BrandContext>,
}

impl AnalysisRequest {
    /// Create a request, rejecting empty or whitespace-only text.
    pub fn new(text: impl Into<String>) -> Result<Self, RequestError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(RequestError::EmptyText);
        }
        Ok(Self {
            text,
            brand_context: None,
        })
    }

    pub fn with_brand_context(mut self, brand_context: BrandContext) -> Self {
        self.brand_context = Some(brand_context);
        self
    }

    /// The full, original text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn brand_context(&self) -> Option<&BrandContext> {
        self.brand_context.as_ref()
    }

    /// The text cut to at most `max_chars` characters.
    pub fn truncated_text(&self, max_chars: usize) -> &str {
        truncate_chars(&self.text, max_chars)
    }
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
