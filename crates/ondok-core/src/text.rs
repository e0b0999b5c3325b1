//! Text processing utilities.
//!
//! Word-like runs are maximal sequences of letters (Hangul included) and
//! digits. Punctuation, whitespace and symbols separate tokens. Korean
//! particles stay attached to their stem: no morphological analysis.

use regex::Regex;
use std::sync::LazyLock;

/// Regex for word-like runs.
static WORD_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("valid regex"));

/// Split text into word-like tokens, in order of appearance.
pub fn tokenize(text: &str) -> Vec<&str> {
    WORD_RUN.find_iter(text).map(|m| m.as_str()).collect()
}

/// Number of word-like tokens in `text`.
pub fn count_tokens(text: &str) -> usize {
    WORD_RUN.find_iter(text).count()
}
