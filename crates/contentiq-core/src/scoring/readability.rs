//! Readability
//!
//! A Flesch reading-ease approximation with the coefficients commonly used
//! for Portuguese. Syllables are approximated by counting vowels.
//!
//! ```text
//! score = 248.835 - 1.015 * (words / sentences) - 84.6 * (syllables / words)
//! ```
//!
//! The result is a relative signal, not a validated linguistic metric.

use serde::Serialize;

use super::patterns::{count_sentences, count_vowels, count_words};

const BASE: f64 = 248.835;
const SENTENCE_LENGTH_WEIGHT: f64 = 1.015;
const SYLLABLE_WEIGHT: f64 = 84.6;

/// Counts feeding the readability formula. Every count is at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub sentences: usize,
    pub words: usize,
    pub syllables: usize,
}

impl TextStats {
    pub fn from_text(text: &str) -> Self {
        Self {
            sentences: count_sentences(text).max(1),
            words: count_words(text).max(1),
            syllables: count_vowels(text).max(1),
        }
    }

    pub fn avg_sentence_length(&self) -> f64 {
        self.words as f64 / self.sentences as f64
    }

    pub fn avg_syllables_per_word(&self) -> f64 {
        self.syllables as f64 / self.words as f64
    }

    /// Unclamped reading-ease value.
    pub fn raw_score(&self) -> f64 {
        BASE - SENTENCE_LENGTH_WEIGHT * self.avg_sentence_length()
            - SYLLABLE_WEIGHT * self.avg_syllables_per_word()
    }
}

/// Readability of `text` in `[0, 100]`.
pub fn readability_score(text: &str) -> u8 {
    let score = TextStats::from_text(text).raw_score();
    score.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_campaign_copy() {
        // 7 words, 2 sentences, 15 vowels
        let text = "Buy now! Guaranteed best-in-class results, act today!";
        let stats = TextStats::from_text(text);
        assert_eq!(stats, TextStats { sentences: 2, words: 7, syllables: 15 });
        assert_eq!(readability_score(text), 64);
    }

    #[test]
    fn test_empty_text_uses_minimums() {
        let stats = TextStats::from_text("");
        assert_eq!(stats, TextStats { sentences: 1, words: 1, syllables: 1 });
        // 248.835 - 1.015 - 84.6 clamps to 100
        assert_eq!(readability_score(""), 100);
    }

    #[test]
    fn test_dense_text_clamps_to_zero() {
        let text = "Inconstitucionalissimamente aeiouaeiouaeiou oooooooooooo";
        assert_eq!(readability_score(text), 0);
    }

    #[test]
    fn test_short_plain_sentences_score_high() {
        let text = "Eu vi o sol. Ele brilha. Tu vens.";
        assert!(readability_score(text) > 80);
    }

    #[test]
    fn test_long_sentences_score_lower() {
        let short = "We ship fast. We care. You win.";
        let long = "We ship remarkably fast because operational excellence, \
                    meticulous logistics coordination and comprehensive customer \
                    orientation constitute our organisational foundation";
        assert!(readability_score(short) > readability_score(long));
    }

    proptest! {
        #[test]
        fn prop_readability_in_range(text in ".{0,400}") {
            let score = readability_score(&text);
            prop_assert!(score <= 100);
        }

        #[test]
        fn prop_readability_is_deterministic(text in ".{0,200}") {
            prop_assert_eq!(readability_score(&text), readability_score(&text));
        }
    }
}
