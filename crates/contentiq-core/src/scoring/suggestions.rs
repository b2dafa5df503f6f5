//! Suggestion synthesis.
//!
//! Rules are checked in a fixed priority order and the first
//! [`MAX_SUGGESTIONS`] matches are kept.

use crate::types::{ContentAnalysis, SentimentLabel, MAX_SUGGESTIONS};

/// Readability below this triggers [`Suggestion::SimplifySentences`].
pub const LOW_READABILITY: u8 = 40;

/// Brand alignment below this triggers [`Suggestion::ReviewBrandGuidelines`].
pub const LOW_BRAND_ALIGNMENT: u8 = 60;

/// Negative sentiment below this score triggers [`Suggestion::AdjustNegativeTone`].
pub const STRONG_NEGATIVE_SENTIMENT: f64 = -0.5;

/// Anger or fear above this triggers [`Suggestion::CheckEmotionalIntensity`].
pub const HIGH_EMOTION: f64 = 0.5;

/// Fewer keywords than this triggers [`Suggestion::AddFocus`].
pub const MIN_KEYWORDS: usize = 3;

/// An actionable suggestion, listed in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suggestion {
    SimplifySentences,
    ReviewBrandGuidelines,
    AdjustNegativeTone,
    CheckEmotionalIntensity,
    AddFocus,
}

impl Suggestion {
    /// All suggestions, highest priority first.
    pub const PRIORITY: [Suggestion; 5] = [
        Suggestion::SimplifySentences,
        Suggestion::ReviewBrandGuidelines,
        Suggestion::AdjustNegativeTone,
        Suggestion::CheckEmotionalIntensity,
        Suggestion::AddFocus,
    ];

    pub fn message(&self) -> &'static str {
        match self {
            Suggestion::SimplifySentences => "Simplify sentence structure for better readability",
            Suggestion::ReviewBrandGuidelines => {
                "Review content against brand guidelines: alignment is low"
            }
            Suggestion::AdjustNegativeTone => {
                "Consider adjusting tone: content reads overly negative"
            }
            Suggestion::CheckEmotionalIntensity => {
                "High emotional intensity detected: verify this is intentional"
            }
            Suggestion::AddFocus => {
                "Content may lack focus: consider adding more relevant keywords"
            }
        }
    }

    /// Whether this suggestion applies to `analysis`.
    pub fn applies_to(&self, analysis: &ContentAnalysis) -> bool {
        match self {
            Suggestion::SimplifySentences => analysis.readability_score < LOW_READABILITY,
            Suggestion::ReviewBrandGuidelines => {
                analysis.brand_alignment_score < LOW_BRAND_ALIGNMENT
            }
            Suggestion::AdjustNegativeTone => {
                analysis.sentiment.label == SentimentLabel::Negative
                    && analysis.sentiment.score < STRONG_NEGATIVE_SENTIMENT
            }
            Suggestion::CheckEmotionalIntensity => {
                analysis.emotions.anger > HIGH_EMOTION || analysis.emotions.fear > HIGH_EMOTION
            }
            Suggestion::AddFocus => analysis.keywords.len() < MIN_KEYWORDS,
        }
    }
}

/// Matching suggestions for `analysis`, at most [`MAX_SUGGESTIONS`].
pub fn matching_suggestions(analysis: &ContentAnalysis) -> Vec<Suggestion> {
    Suggestion::PRIORITY
        .iter()
        .copied()
        .filter(|s| s.applies_to(analysis))
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Suggestion messages for `analysis`, at most [`MAX_SUGGESTIONS`].
pub fn generate_suggestions(analysis: &ContentAnalysis) -> Vec<String> {
    matching_suggestions(analysis)
        .into_iter()
        .map(|s| s.message().to_string())
        .collect()
}
