//! Synthesizer: turns a provider's base analysis into the final result.
//!
//! The synthesizer applies the same steps to every base analysis, whichever
//! provider produced it:
//! 1. Clamp every provider-supplied number into range
//! 2. Overwrite `brand_alignment_score` from the original text and brand context
//! 3. Overwrite `readability_score` from the original text
//! 4. Overwrite `suggestions` from the merged analysis
//!
//! Provider values for the overwritten fields are discarded even if present.

use crate::request::AnalysisRequest;
use crate::scoring::{brand_alignment_score, generate_suggestions, readability_score};
use crate::types::ContentAnalysis;

/// The Synthesizer finishes a base analysis with locally computed fields.
pub struct Synthesizer;

impl Synthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Produce the final analysis for `request` from `base`.
    pub fn synthesize(&self, base: ContentAnalysis, request: &AnalysisRequest) -> ContentAnalysis {
        let mut analysis = base;
        analysis.normalize();

        let text = request.text();
        analysis.brand_alignment_score =
            brand_alignment_score(text, &analysis.keywords, request.brand_context());
        analysis.readability_score = readability_score(text);
        analysis.suggestions = generate_suggestions(&analysis);

        tracing::debug!(
            brand_alignment = analysis.brand_alignment_score,
            readability = analysis.readability_score,
            suggestions = analysis.suggestions.len(),
            "Analysis synthesized"
        );

        analysis
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::BrandContext;
    use crate::scoring::Suggestion;
    use crate::types::{KeywordResult, SentimentLabel, SentimentResult};

    #[test]
    fn test_provider_scores_are_discarded() {
        let request = AnalysisRequest::new("Short text. Easy read.").unwrap();
        let mut base = ContentAnalysis::neutral();
        base.brand_alignment_score = 3;
        base.readability_score = 7;
        base.suggestions = vec!["from the model".to_string()];

        let result = Synthesizer::new().synthesize(base, &request);

        assert_eq!(result.brand_alignment_score, 70);
        assert_eq!(result.readability_score, readability_score(request.text()));
        assert!(!result.suggestions.iter().any(|s| s == "from the model"));
    }

    #[test]
    fn test_scores_use_full_text_and_brand() {
        let brand = BrandContext::new().with_forbidden_words(["guaranteed", "best-in-class"]);
        let request = AnalysisRequest::new("Buy now! Guaranteed best-in-class results, act today!")
            .unwrap()
            .with_brand_context(brand);

        let result = Synthesizer::new().synthesize(ContentAnalysis::neutral(), &request);

        assert_eq!(result.brand_alignment_score, 40);
        assert_eq!(result.readability_score, 64);
        assert_eq!(
            result.suggestions,
            vec![
                Suggestion::ReviewBrandGuidelines.message().to_string(),
                Suggestion::AddFocus.message().to_string(),
            ]
        );
    }

    #[test]
    fn test_keyword_relevance_is_clamped_before_scoring() {
        let request = AnalysisRequest::new("text").unwrap();
        let mut base = ContentAnalysis::neutral();
        base.keywords = vec![KeywordResult::new("k", 4.0)];
        base.sentiment = SentimentResult::new(SentimentLabel::Negative, -7.0);

        let result = Synthesizer::new().synthesize(base, &request);

        assert_eq!(result.keywords[0].relevance, 1.0);
        assert_eq!(result.sentiment.score, -1.0);
        assert_eq!(result.brand_alignment_score, 80);
        assert!(result
            .suggestions
            .contains(&Suggestion::AdjustNegativeTone.message().to_string()));
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let request = AnalysisRequest::new("Same input, same output.").unwrap();
        let synthesizer = Synthesizer::new();
        let a = synthesizer.synthesize(ContentAnalysis::neutral(), &request);
        let b = synthesizer.synthesize(ContentAnalysis::neutral(), &request);
        assert_eq!(a, b);
    }
}
