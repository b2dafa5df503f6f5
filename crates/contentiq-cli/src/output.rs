//! Human-readable rendering.

use std::fmt::Write;

use contentiq_core::ContentAnalysis;
use contentiq_runtime::AnalysisReport;

pub fn render_analysis(analysis: &ContentAnalysis) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Sentiment:        {} ({:+.2})",
        analysis.sentiment.label, analysis.sentiment.score
    );
    let e = &analysis.emotions;
    let _ = writeln!(
        out,
        "Emotions:         joy {:.2}  anger {:.2}  disgust {:.2}  sadness {:.2}  fear {:.2}",
        e.joy, e.anger, e.disgust, e.sadness, e.fear
    );
    let _ = writeln!(out, "Brand alignment:  {}/100", analysis.brand_alignment_score);
    let _ = writeln!(out, "Readability:      {}/100", analysis.readability_score);

    if !analysis.keywords.is_empty() {
        let _ = writeln!(out, "Keywords:");
        for keyword in &analysis.keywords {
            let _ = writeln!(out, "  - {} ({:.2})", keyword.text, keyword.relevance);
        }
    }

    if !analysis.categories.is_empty() {
        let _ = writeln!(out, "Categories:");
        for category in &analysis.categories {
            let _ = writeln!(out, "  - {} ({:.2})", category.label, category.score);
        }
    }

    if !analysis.suggestions.is_empty() {
        let _ = writeln!(out, "Suggestions:");
        for suggestion in &analysis.suggestions {
            let _ = writeln!(out, "  * {}", suggestion);
        }
    }

    out
}

pub fn render_report(report: &AnalysisReport) -> String {
    let mut out = render_analysis(&report.analysis);

    let _ = writeln!(out, "Source:           {}", report.source.as_str());
    if let Some(reason) = &report.primary_error {
        let _ = writeln!(out, "Primary skipped:  {}", reason);
    }
    if let Some(reason) = &report.fallback_error {
        let _ = writeln!(out, "Fallback failed:  {}", reason);
    }
    if let Some(usage) = &report.usage {
        let _ = writeln!(
            out,
            "Tokens:           {} prompt + {} generated",
            usage.prompt_tokens, usage.completion_tokens
        );
    }

    out
}
