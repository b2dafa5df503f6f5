//! Prompts for the generative fallback analyzer.
//!
//! The schema asks for everything except brand alignment and readability;
//! those are computed locally and any model value would be discarded.

/// System prompt for the fallback analysis call.
pub const FALLBACK_SYSTEM_PROMPT: &str = r#"You are a content analysis engine.
You read marketing and editorial text and report its sentiment, emotional tone,
keywords and topic categories as a single JSON object.
You never add commentary, explanations or markdown. You only output JSON."#;

/// Analysis instructions. `{content}` is replaced with the text.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the following content and return a JSON object with:
- "sentiment": {"label": "positive"|"negative"|"neutral", "score": -1.0 to 1.0}
- "emotions": {"joy": 0-1, "anger": 0-1, "disgust": 0-1, "sadness": 0-1, "fear": 0-1}
- "keywords": [{"text": "keyword", "relevance": 0-1}] (top 10, most relevant first)
- "categories": [{"label": "category", "score": 0-1}] (top 3)

Content to analyze:
{content}

Return ONLY valid JSON, no markdown fences."#;

/// Build the user prompt for `content`.
///
/// The caller is responsible for truncating `content`.
pub fn analysis_prompt(content: &str) -> String {
    ANALYSIS_PROMPT_TEMPLATE.replace("{content}", content)
}
