//! Shared text patterns for the scoring functions.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Runs of sentence terminators.
    pub static ref SENTENCE_TERMINATORS: Regex = Regex::new(r"[.!?]+").unwrap();

    /// Vowels, including the accented set of Portuguese. Case-insensitive.
    pub static ref VOWEL: Regex = Regex::new(r"(?i)[aeiouáéíóúâêîôûãõ]").unwrap();
}

/// Number of non-empty pieces left after splitting on sentence terminators.
pub fn count_sentences(text: &str) -> usize {
    SENTENCE_TERMINATORS
        .split(text)
        .filter(|piece| !piece.is_empty())
        .count()
}

/// Number of whitespace-separated words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of vowel characters, used as a syllable approximation.
pub fn count_vowels(text: &str) -> usize {
    VOWEL.find_iter(text).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_counting() {
        assert_eq!(count_sentences("One. Two! Three?"), 3);
        assert_eq!(count_sentences("Wait... what?!"), 2);
        assert_eq!(count_sentences("No terminator"), 1);
        assert_eq!(count_sentences("..."), 0);
        assert_eq!(count_sentences(""), 0);
    }

    #[test]
    fn test_word_counting() {
        assert_eq!(count_words("  spaced   out\twords\n"), 3);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn test_vowel_counting_includes_accents() {
        assert_eq!(count_vowels("rhythm"), 0);
        assert_eq!(count_vowels("AEIOU"), 5);
        assert_eq!(count_vowels("ação"), 3);
        assert_eq!(count_vowels("ÁÉÍÓÚ âêô"), 8);
    }
}
