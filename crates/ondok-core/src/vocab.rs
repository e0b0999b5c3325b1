//! The graded cognitive tool word vocabulary.
//!
//! Each word carries a grade from 1 (hardest, rarest) to 4 (easiest, most
//! common). Grades drive two weighting tables: an integer base weight that
//! inverts the grade, and an empirical STTR correction factor.

use std::collections::HashMap;
use std::fmt;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::{TableError, TableResult};
use crate::tables::{self, Records};

/// Accepted header spellings for the word column.
const WORD_HEADERS: &[&str] = &["단어", "word"];

/// Accepted header spellings for the grade column.
const GRADE_HEADERS: &[&str] = &["등급", "grade"];

/// Largest base weight (grade 1).
pub const MAX_BASE_WEIGHT: u32 = 4;

/// Difficulty tier of a cognitive tool word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Grade {
    /// Hardest tier.
    One = 1,
    /// Second tier.
    Two = 2,
    /// Third tier.
    Three = 3,
    /// Easiest tier.
    Four = 4,
}

impl Grade {
    /// All grades, hardest first.
    pub const ALL: [Self; 4] = [Self::One, Self::Two, Self::Three, Self::Four];

    /// Numeric grade (1–4).
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Integer base weight: 4 for grade 1 down to 1 for grade 4.
    pub const fn base_weight(self) -> u32 {
        match self {
            Self::One => 4,
            Self::Two => 3,
            Self::Three => 2,
            Self::Four => 1,
        }
    }

    /// Empirical STTR correction factor.
    pub const fn sttr_correction(self) -> f64 {
        match self {
            Self::One => 0.73,
            Self::Two => 0.68,
            Self::Three => 0.61,
            Self::Four => 0.55,
        }
    }

    /// Base weight multiplied by the STTR correction.
    pub fn combined_weight(self) -> f64 {
        f64::from(self.base_weight()) * self.sttr_correction()
    }
}

impl TryFrom<u8> for Grade {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            4 => Ok(Self::Four),
            other => Err(format!("grade must be 1-4, got {other}")),
        }
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> Self {
        grade.as_u8()
    }
}

impl std::str::FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("grade is not an integer: '{}'", s.trim()))?;
        Self::try_from(n)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// One row of the vocabulary table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VocabEntry {
    /// The word, exactly as authored.
    pub word: String,
    /// Its difficulty tier.
    pub grade: Grade,
}

impl VocabEntry {
    /// Create an entry.
    pub fn new(word: impl Into<String>, grade: Grade) -> Self {
        Self {
            word: word.into(),
            grade,
        }
    }
}

/// Immutable word → grade table.
///
/// Preserves authoring order for listing and prompt construction.
#[derive(Debug, Clone, Default)]
pub struct VocabTable {
    entries: Vec<VocabEntry>,
    index: HashMap<String, usize>,
}

impl VocabTable {
    /// Build a table from entries. A repeated word keeps its first grade.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = VocabEntry>,
    {
        let mut table = Self::default();
        for entry in entries {
            if let Some(&existing) = table.index.get(&entry.word) {
                tracing::warn!(
                    word = %entry.word,
                    kept = %table.entries[existing].grade,
                    ignored = %entry.grade,
                    "duplicate vocabulary word"
                );
                continue;
            }
            table.index.insert(entry.word.clone(), table.entries.len());
            table.entries.push(entry);
        }
        table
    }

    /// Load a vocabulary CSV file.
    #[tracing::instrument]
    pub fn load(path: &Utf8Path) -> TableResult<Self> {
        let text = tables::read_table(path)?;
        let table = Self::parse(&text)?;
        tracing::info!(words = table.len(), "vocabulary loaded");
        Ok(table)
    }

    /// Parse vocabulary CSV text with `단어`/`word` and `등급`/`grade` columns.
    pub fn parse(text: &str) -> TableResult<Self> {
        let records = Records::parse(text)?;
        let word_col = records.column("word", WORD_HEADERS)?;
        let grade_col = records.column("grade", GRADE_HEADERS)?;

        let mut entries = Vec::new();
        for (line, cells) in records.rows() {
            let word = tables::cell(cells, word_col, line)?;
            if word.is_empty() {
                return Err(TableError::InvalidRow {
                    line,
                    message: "empty word".to_string(),
                });
            }
            let grade = tables::cell(cells, grade_col, line)?
                .parse::<Grade>()
                .map_err(|message| TableError::InvalidRow { line, message })?;
            entries.push(VocabEntry::new(word, grade));
        }
        Ok(Self::from_entries(entries))
    }

    /// Grade of `word`, if it is a tool word.
    pub fn grade_of(&self, word: &str) -> Option<Grade> {
        self.get(word).map(|e| e.grade)
    }

    /// The entry for `word`.
    pub fn get(&self, word: &str) -> Option<&VocabEntry> {
        self.index.get(word).map(|&i| &self.entries[i])
    }

    /// Whether an exact (word, grade) row exists.
    pub fn contains_pair(&self, word: &str, grade: Grade) -> bool {
        self.grade_of(word) == Some(grade)
    }

    /// Entries in authoring order.
    pub fn entries(&self) -> &[VocabEntry] {
        &self.entries
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no words.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_invert_grade() {
        assert_eq!(Grade::One.base_weight(), MAX_BASE_WEIGHT);
        assert_eq!(Grade::Four.base_weight(), 1);
        assert!((Grade::One.combined_weight() - 2.92).abs() < 1e-9);
        assert!((Grade::Four.combined_weight() - 0.55).abs() < 1e-9);
    }

    #[test]
    fn grade_parsing() {
        assert_eq!(" 3 ".parse::<Grade>(), Ok(Grade::Three));
        assert!("5".parse::<Grade>().is_err());
        assert!("two".parse::<Grade>().is_err());
    }

    #[test]
    fn parses_korean_headers() {
        let table = VocabTable::parse("단어,등급\n분석,1\n추론,2\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.grade_of("분석"), Some(Grade::One));
        assert_eq!(table.grade_of("추론"), Some(Grade::Two));
        assert_eq!(table.grade_of("비교"), None);
    }

    #[test]
    fn extra_columns_are_ignored() {
        let table = VocabTable::parse("번호,단어,뜻,등급\n1,분석,쪼개어 살핌,1\n").unwrap();
        assert_eq!(table.grade_of("분석"), Some(Grade::One));
    }

    #[test]
    fn duplicate_word_keeps_first_grade() {
        let table = VocabTable::parse("word,grade\n분석,1\n분석,3\n").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.grade_of("분석"), Some(Grade::One));
    }

    #[test]
    fn invalid_grade_reports_line() {
        let err = VocabTable::parse("단어,등급\n분석,1\n추론,x\n").unwrap_err();
        match err {
            TableError::InvalidRow { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn out_of_range_grade_rejected() {
        assert!(VocabTable::parse("단어,등급\n분석,0\n").is_err());
    }

    #[test]
    fn contains_pair_requires_exact_grade() {
        let table = VocabTable::from_entries([VocabEntry::new("분석", Grade::One)]);
        assert!(table.contains_pair("분석", Grade::One));
        assert!(!table.contains_pair("분석", Grade::Two));
        assert!(!table.contains_pair("추론", Grade::One));
    }

    #[test]
    fn grade_serializes_as_number() {
        let json = serde_json::to_string(&VocabEntry::new("분석", Grade::Two)).unwrap();
        assert_eq!(json, r#"{"word":"분석","grade":2}"#);
        let back: VocabEntry = serde_json::from_str(r#"{"word":"x","grade":4}"#).unwrap();
        assert_eq!(back.grade, Grade::Four);
        assert!(serde_json::from_str::<VocabEntry>(r#"{"word":"x","grade":9}"#).is_err());
    }
}
