//! Parsing and validating (word, grade) pairs from a generative model.
//!
//! Model output is untrusted free text. It may be a pseudo-table
//! (`| 분석 | 1 |`), delimiter pairs (`분석/1`, `분석: 1등급`, `분석 - 1`),
//! several pairs on one line, numbered or bulleted, mixed with prose.
//!
//! [`parse_extraction`] never fails: every line either yields candidates
//! or is recorded with a [`SkipReason`]. [`reconcile`] then keeps only
//! candidates whose exact (word, grade) row exists in the vocabulary, and
//! deduplicates them. Nothing from the model reaches scoring without
//! passing through both steps.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::matcher::MatchSet;
use crate::vocab::{Grade, VocabEntry, VocabTable};

/// `word <delim> grade` pairs. Delimiters: `/ : = -` and en dash.
static PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<word>\p{L}[\p{L}\p{N}]*)\s*[/:=\-–]\s*(?P<grade>[^\s,;/|)]+)")
        .expect("valid regex")
});

/// Leading list markers: `-`, `*`, `•`, `1.`, `1)`.
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•·]\s+|\d+[.)]\s*)").expect("valid regex"));

/// Table separator rows such as `|---|:---:|`.
static SEPARATOR_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s|:\-–=+]+$").expect("valid regex"));

/// A (word, grade) pair proposed by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Candidate {
    /// 1-based line in the response.
    pub line: usize,
    /// Proposed word.
    pub word: String,
    /// Proposed grade (1–4).
    pub grade: u8,
}

/// Why a response line produced no candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// No `word/grade` pair or table row could be found.
    NoPair,
    /// A pair was found but its grade is not an integer in 1–4.
    InvalidGrade {
        /// The offending grade text.
        value: String,
    },
}

/// A response line that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SkippedLine {
    /// 1-based line in the response.
    pub line: usize,
    /// The trimmed line text.
    pub text: String,
    /// Why it was skipped.
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Result of parsing a model response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractionParse {
    /// Pairs found, in response order.
    pub candidates: Vec<Candidate>,
    /// Lines that yielded nothing.
    pub skipped: Vec<SkippedLine>,
}

/// Parse a grade cell such as `1`, `1등급`, `2급`.
fn parse_grade_loose(raw: &str) -> Option<Grade> {
    let raw = raw.trim();
    let digits_end = raw
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(raw.len(), |(i, _)| i);
    let (digits, suffix) = raw.split_at(digits_end);
    if digits.is_empty() || !matches!(suffix.trim(), "" | "등급" | "급") {
        return None;
    }
    digits.parse::<u8>().ok().and_then(|n| Grade::try_from(n).ok())
}

/// Parse a model response into candidates and skip reasons.
#[tracing::instrument(skip_all, fields(response_len = response.len()))]
pub fn parse_extraction(response: &str) -> ExtractionParse {
    let mut parse = ExtractionParse::default();

    for (i, raw) in response.lines().enumerate() {
        let line_no = i + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || SEPARATOR_ROW.is_match(trimmed) {
            continue;
        }
        let line = LIST_MARKER.replace(trimmed, "");

        let outcome = if line.contains('|') {
            parse_table_row(&line, line_no)
        } else {
            parse_pairs(&line, line_no)
        };

        match outcome {
            Ok(mut found) => parse.candidates.append(&mut found),
            Err(reason) => {
                tracing::debug!(line = line_no, ?reason, "skipping extraction line");
                parse.skipped.push(SkippedLine {
                    line: line_no,
                    text: trimmed.to_string(),
                    reason,
                });
            }
        }
    }

    tracing::debug!(
        candidates = parse.candidates.len(),
        skipped = parse.skipped.len(),
        "extraction parsed"
    );
    parse
}

/// `| word | grade |`: first cell is the word, last cell the grade.
fn parse_table_row(line: &str, line_no: usize) -> Result<Vec<Candidate>, SkipReason> {
    let cells: Vec<&str> = line
        .split('|')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    let [word, .., grade_cell] = cells.as_slice() else {
        return Err(SkipReason::NoPair);
    };
    let grade = parse_grade_loose(grade_cell).ok_or_else(|| SkipReason::InvalidGrade {
        value: (*grade_cell).to_string(),
    })?;
    Ok(vec![Candidate {
        line: line_no,
        word: (*word).to_string(),
        grade: grade.as_u8(),
    }])
}

/// One or more `word/grade` pairs on a line.
fn parse_pairs(line: &str, line_no: usize) -> Result<Vec<Candidate>, SkipReason> {
    let mut found = Vec::new();
    let mut first_bad = None;

    for caps in PAIR.captures_iter(line) {
        let word = &caps["word"];
        let grade_text = &caps["grade"];
        match parse_grade_loose(grade_text) {
            Some(grade) => found.push(Candidate {
                line: line_no,
                word: word.to_string(),
                grade: grade.as_u8(),
            }),
            None => {
                first_bad.get_or_insert_with(|| grade_text.to_string());
            }
        }
    }

    if !found.is_empty() {
        return Ok(found);
    }
    Err(first_bad.map_or(SkipReason::NoPair, |value| SkipReason::InvalidGrade { value }))
}

/// Why a parsed candidate was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// The word is not in the vocabulary.
    NotInVocabulary,
    /// The word exists with a different grade.
    GradeMismatch {
        /// Grade recorded in the vocabulary.
        expected: u8,
    },
}

/// A candidate that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Rejection {
    /// The candidate.
    #[serde(flatten)]
    pub candidate: Candidate,
    /// Why it was rejected.
    #[serde(flatten)]
    pub reason: RejectReason,
}

/// Validated, deduplicated matches from a model response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Accepted matches, one per word.
    pub matches: MatchSet,
    /// Candidates that failed validation.
    pub rejected: Vec<Rejection>,
    /// Accepted candidates dropped as repeats.
    pub duplicates: usize,
    /// Lines the parser skipped.
    pub skipped: Vec<SkippedLine>,
}

/// Validate parsed candidates against the vocabulary.
#[tracing::instrument(skip_all, fields(candidates = parse.candidates.len()))]
pub fn reconcile(parse: ExtractionParse, vocab: &VocabTable) -> Reconciliation {
    let mut seen: HashSet<String> = HashSet::new();
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    let mut duplicates = 0;

    for candidate in parse.candidates {
        let verdict = match Grade::try_from(candidate.grade) {
            Ok(grade) if vocab.contains_pair(&candidate.word, grade) => Ok(grade),
            _ => Err(match vocab.grade_of(&candidate.word) {
                Some(expected) => RejectReason::GradeMismatch {
                    expected: expected.as_u8(),
                },
                None => RejectReason::NotInVocabulary,
            }),
        };

        match verdict {
            Ok(grade) => {
                if seen.insert(candidate.word.clone()) {
                    accepted.push(VocabEntry::new(candidate.word, grade));
                } else {
                    duplicates += 1;
                }
            }
            Err(reason) => rejected.push(Rejection { candidate, reason }),
        }
    }

    tracing::info!(
        accepted = accepted.len(),
        rejected = rejected.len(),
        duplicates,
        "extraction reconciled"
    );
    Reconciliation {
        matches: MatchSet::from_occurrences(accepted),
        rejected,
        duplicates,
        skipped: parse.skipped,
    }
}
