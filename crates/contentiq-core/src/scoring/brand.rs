//! Brand alignment
//!
//! | Term | Contribution |
//! |------|--------------|
//! | Base | +70 |
//! | Each forbidden word present (case-insensitive substring) | -15 |
//! | Mandatory elements present | `found / total * 20`, 0 when none are defined |
//! | Keyword focus | `mean relevance * 10`, 0 when there are no keywords |
//!
//! Terms are summed first and the total is rounded and clamped to
//! `[0, 100]` once, at the very end. Intermediate values may go negative.
//!
//! The brand voice is carried for providers and reporting but does not
//! contribute to the score.

use crate::request::BrandContext;
use crate::types::{average_relevance, KeywordResult};

/// Starting score before any rule applies.
pub const BASE_SCORE: f64 = 70.0;

/// Penalty per forbidden word found.
pub const FORBIDDEN_WORD_PENALTY: f64 = 15.0;

/// Bonus when every mandatory element is present.
pub const MANDATORY_ELEMENTS_BONUS: f64 = 20.0;

/// Bonus for a mean keyword relevance of 1.0.
pub const KEYWORD_FOCUS_BONUS: f64 = 10.0;

/// Brand alignment of `text` in `[0, 100]`.
///
/// Forbidden words and mandatory elements that are blank after trimming
/// are ignored.
pub fn brand_alignment_score(
    text: &str,
    keywords: &[KeywordResult],
    brand: Option<&BrandContext>,
) -> u8 {
    raw_brand_alignment(text, keywords, brand)
        .round()
        .clamp(0.0, 100.0) as u8
}

/// The unrounded, unclamped brand alignment sum.
pub fn raw_brand_alignment(
    text: &str,
    keywords: &[KeywordResult],
    brand: Option<&BrandContext>,
) -> f64 {
    let lower = text.to_lowercase();
    let mut score = BASE_SCORE;

    if let Some(brand) = brand {
        let forbidden_hits = count_present(&lower, &brand.forbidden_words);
        score -= forbidden_hits as f64 * FORBIDDEN_WORD_PENALTY;

        let mandatory: Vec<&String> = non_blank(&brand.mandatory_elements).collect();
        if !mandatory.is_empty() {
            let found = mandatory
                .iter()
                .filter(|element| lower.contains(&element.to_lowercase()))
                .count();
            score += found as f64 / mandatory.len() as f64 * MANDATORY_ELEMENTS_BONUS;
        }
    }

    score + average_relevance(keywords) * KEYWORD_FOCUS_BONUS
}

/// Forbidden words present in `text`, in the order they were given.
pub fn forbidden_words_found<'a>(text: &str, brand: &'a BrandContext) -> Vec<&'a str> {
    let lower = text.to_lowercase();
    non_blank(&brand.forbidden_words)
        .filter(|word| lower.contains(&word.to_lowercase()))
        .map(String::as_str)
        .collect()
}

fn count_present(lower_text: &str, words: &[String]) -> usize {
    non_blank(words)
        .filter(|word| lower_text.contains(&word.to_lowercase()))
        .count()
}

fn non_blank(words: &[String]) -> impl Iterator<Item = &String> {
    words.iter().filter(|w| !w.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CAMPAIGN: &str = "Buy now! Guaranteed best-in-class results, act today!";

    #[test]
    fn test_base_score_without_brand() {
        assert_eq!(brand_alignment_score("Anything", &[], None), 70);
    }

    #[test]
    fn test_forbidden_words_penalized() {
        let brand = BrandContext::new().with_forbidden_words(["guaranteed", "best-in-class"]);
        assert_eq!(brand_alignment_score(CAMPAIGN, &[], Some(&brand)), 40);
        assert_eq!(
            forbidden_words_found(CAMPAIGN, &brand),
            vec!["guaranteed", "best-in-class"]
        );
    }

    #[test]
    fn test_forbidden_match_is_case_insensitive_substring() {
        let brand = BrandContext::new().with_forbidden_words(["GUARANTEE"]);
        assert_eq!(brand_alignment_score(CAMPAIGN, &[], Some(&brand)), 55);
    }

    #[test]
    fn test_mandatory_elements_prorated() {
        let brand = BrandContext::new().with_mandatory_elements(["#verao", "link na bio"]);
        assert_eq!(
            brand_alignment_score("Promo de #VERAO chegando", &[], Some(&brand)),
            80
        );
        assert_eq!(
            brand_alignment_score("#verao, link na bio", &[], Some(&brand)),
            90
        );
    }

    #[test]
    fn test_zero_mandatory_elements_contribute_nothing() {
        let brand = BrandContext::new();
        assert_eq!(raw_brand_alignment("text", &[], Some(&brand)), BASE_SCORE);
    }

    #[test]
    fn test_keyword_focus_bonus() {
        let keywords = vec![KeywordResult::new("a", 0.9), KeywordResult::new("b", 0.7)];
        // 70 + 0.8 * 10
        assert_eq!(brand_alignment_score("text", &keywords, None), 78);
    }

    #[test]
    fn test_clamps_once_at_the_end() {
        // 70 - 6 * 15 = -20, then +20 for mandatory, +10 for keywords = 10
        let brand = BrandContext::new()
            .with_forbidden_words(["a", "b", "c", "d", "e", "f"])
            .with_mandatory_elements(["abcdef"]);
        let keywords = vec![KeywordResult::new("k", 1.0)];
        assert_eq!(brand_alignment_score("abcdef", &keywords, Some(&brand)), 10);
    }

    #[test]
    fn test_extreme_inputs_stay_in_range() {
        let many: Vec<String> = (0..50).map(|i| format!("w{}", i)).collect();
        let text = many.join(" ");
        let brand = BrandContext::new().with_forbidden_words(&many);
        assert_eq!(brand_alignment_score(&text, &[], Some(&brand)), 0);

        let brand = BrandContext::new().with_mandatory_elements(["x"]);
        let keywords = vec![KeywordResult::new("k", 50.0)];
        assert_eq!(brand_alignment_score("x", &keywords, Some(&brand)), 100);
    }

    #[test]
    fn test_blank_entries_ignored() {
        let brand = BrandContext {
            brand_voice: None,
            forbidden_words: vec!["".to_string(), "  ".to_string()],
            mandatory_elements: vec!["".to_string()],
        };
        assert_eq!(brand_alignment_score("text", &[], Some(&brand)), 70);
    }

    proptest! {
        #[test]
        fn prop_forbidden_word_costs_exactly_fifteen(
            prefix in "[a-z ]{0,30}",
            word in "[a-z]{1,10}",
            suffix in "[a-z ]{0,30}",
        ) {
            let text = format!("{}{}{}", prefix, word.to_uppercase(), suffix);
            let with = BrandContext::new().with_forbidden_words([word.as_str()]);
            let without = BrandContext::new();

            let penalized = raw_brand_alignment(&text, &[], Some(&with));
            let clean = raw_brand_alignment(&text, &[], Some(&without));
            prop_assert!((clean - penalized - FORBIDDEN_WORD_PENALTY).abs() < 1e-9);
        }

        #[test]
        fn prop_score_always_in_range(
            text in ".{0,200}",
            forbidden in proptest::collection::vec("[a-z]{1,4}", 0..40),
            mandatory in proptest::collection::vec("[a-z]{1,4}", 0..10),
            relevances in proptest::collection::vec(-5.0f64..5.0, 0..20),
        ) {
            let brand = BrandContext::new()
                .with_forbidden_words(&forbidden)
                .with_mandatory_elements(&mandatory);
            let keywords: Vec<KeywordResult> = relevances
                .iter()
                .map(|r| KeywordResult::new("k", *r))
                .collect();
            let score = brand_alignment_score(&text, &keywords, Some(&brand));
            prop_assert!(score <= 100);
        }
    }
}
