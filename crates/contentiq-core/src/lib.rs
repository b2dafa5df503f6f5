//! # contentiq-core
//!
//! Deterministic content scoring.
//!
//! This crate owns the analysis data model and every metric that is
//! computed locally rather than trusted from a provider:
//! - Brand alignment (forbidden words, mandatory elements, keyword focus)
//! - Readability (Flesch-style approximation)
//! - Suggestions synthesized from the merged analysis
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces same output
//! 2. **No network calls**: Providers live in `contentiq-runtime`
//! 3. **Bounded**: Every numeric field is clamped before it is returned
//!
//! ## Example
//!
//! ```rust
//! use contentiq_core::{analyze_offline, AnalysisRequest, BrandContext};
//!
//! let brand = BrandContext::new().with_forbidden_words(["guaranteed"]);
//! let request = AnalysisRequest::new("Guaranteed results, act today!")
//!     .unwrap()
//!     .with_brand_context(brand);
//!
//! let analysis = analyze_offline(&request);
//! assert_eq!(analysis.brand_alignment_score, 55);
//! ```

pub mod request;
pub mod scoring;
pub mod synthesizer;
pub mod types;

pub use request::{parse_list, truncate_chars, AnalysisRequest, BrandContext, RequestError};
pub use scoring::{
    brand_alignment_score, generate_suggestions, readability_score, Suggestion, TextStats,
};
pub use synthesizer::Synthesizer;
pub use types::{
    CategoryResult, ContentAnalysis, EmotionResult, KeywordResult, SentimentLabel,
    SentimentResult, MAX_SUGGESTIONS,
};

/// Analyze a request without any provider.
///
/// Sentiment, emotions, keywords and categories stay neutral; brand
/// alignment, readability and suggestions are computed as usual.
pub fn analyze_offline(request: &AnalysisRequest) -> ContentAnalysis {
    Synthesizer::new().synthesize(ContentAnalysis::neutral(), request)
}
