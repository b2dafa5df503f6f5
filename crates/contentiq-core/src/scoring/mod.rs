//! Scoring engine.
//!
//! Everything here is a pure function of its inputs: no I/O, no clock, no
//! randomness. Providers never supply these values.

pub mod brand;
pub mod patterns;
pub mod readability;
pub mod suggestions;

pub use brand::{brand_alignment_score, forbidden_words_found, raw_brand_alignment};
pub use readability::{readability_score, TextStats};
pub use suggestions::{generate_suggestions, matching_suggestions, Suggestion};
