//! Matching text against the vocabulary.
//!
//! Two policies:
//!
//! - [`MatchMode::Token`] (default) splits the text into word-like runs and
//!   keeps every run that is exactly a vocabulary word, one entry per
//!   occurrence.
//! - [`MatchMode::Substring`] reports each vocabulary word contained
//!   anywhere in the text, once, in vocabulary order. There is no boundary
//!   check, so short words also match inside longer ones.

use std::collections::{HashMap, HashSet};

use aho_corasick::AhoCorasick;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::text;
use crate::vocab::{Grade, VocabEntry, VocabTable};

/// How text is matched against the vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum MatchMode {
    /// Exact match on word-like tokens, counting every occurrence.
    #[default]
    Token,
    /// Containment anywhere in the text, once per vocabulary word.
    Substring,
}

impl MatchMode {
    /// Returns the mode as a kebab-case string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Substring => "substring",
        }
    }
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vocabulary rows found in one text.
///
/// Holds one entry per occurrence the matcher produced. Order is not
/// significant for scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    occurrences: Vec<VocabEntry>,
}

/// A matched word with its occurrence count, for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MatchedWord {
    /// The tool word.
    pub word: String,
    /// Its grade (1–4).
    pub grade: u8,
    /// Combined base × STTR weight of the grade.
    pub weight: f64,
    /// How many times it was matched.
    pub count: usize,
}

impl MatchSet {
    /// Wrap a list of occurrences.
    pub const fn from_occurrences(occurrences: Vec<VocabEntry>) -> Self {
        Self { occurrences }
    }

    /// Every occurrence.
    pub fn occurrences(&self) -> &[VocabEntry] {
        &self.occurrences
    }

    /// Grades of every occurrence.
    pub fn grades(&self) -> impl Iterator<Item = Grade> + '_ {
        self.occurrences.iter().map(|e| e.grade)
    }

    /// Number of occurrences.
    pub fn total(&self) -> usize {
        self.occurrences.len()
    }

    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    /// Distinct words, in first-seen order.
    pub fn distinct(&self) -> Vec<&VocabEntry> {
        let mut seen = HashSet::new();
        self.occurrences
            .iter()
            .filter(|e| seen.insert(e.word.as_str()))
            .collect()
    }

    /// Number of distinct words.
    pub fn distinct_count(&self) -> usize {
        self.occurrences
            .iter()
            .map(|e| e.word.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Collapse repeated occurrences of the same word.
    pub fn deduplicated(&self) -> Self {
        Self::from_occurrences(self.distinct().into_iter().cloned().collect())
    }

    /// Per-word summary in first-seen order.
    pub fn summary(&self) -> Vec<MatchedWord> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for e in &self.occurrences {
            *counts.entry(e.word.as_str()).or_insert(0) += 1;
        }
        self.distinct()
            .into_iter()
            .map(|e| MatchedWord {
                word: e.word.clone(),
                grade: e.grade.as_u8(),
                weight: e.grade.combined_weight(),
                count: counts.get(e.word.as_str()).copied().unwrap_or(0),
            })
            .collect()
    }
}

/// Find the vocabulary words used in `text`.
#[tracing::instrument(skip(text, vocab), fields(text_len = text.len(), vocab = vocab.len()))]
pub fn match_text(text: &str, vocab: &VocabTable, mode: MatchMode) -> MatchSet {
    if text.trim().is_empty() || vocab.is_empty() {
        return MatchSet::default();
    }
    let matches = match mode {
        MatchMode::Token => match_tokens(text, vocab),
        MatchMode::Substring => match_substrings(text, vocab),
    };
    tracing::debug!(
        total = matches.total(),
        distinct = matches.distinct_count(),
        "matched tool words"
    );
    matches
}

fn match_tokens(text: &str, vocab: &VocabTable) -> MatchSet {
    MatchSet::from_occurrences(
        text::tokenize(text)
            .into_iter()
            .filter_map(|token| vocab.get(token).cloned())
            .collect(),
    )
}

fn match_substrings(text: &str, vocab: &VocabTable) -> MatchSet {
    let words = vocab.entries().iter().map(|e| e.word.as_str());
    let present: HashSet<usize> = match AhoCorasick::new(words) {
        Ok(ac) => ac
            .find_overlapping_iter(text)
            .map(|m| m.pattern().as_usize())
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "substring automaton unavailable, scanning linearly");
            vocab
                .entries()
                .iter()
                .enumerate()
                .filter(|(_, entry)| text.contains(entry.word.as_str()))
                .map(|(i, _)| i)
                .collect()
        }
    };

    MatchSet::from_occurrences(
        vocab
            .entries()
            .iter()
            .enumerate()
            .filter(|(i, _)| present.contains(i))
            .map(|(_, e)| e.clone())
            .collect(),
    )
}
