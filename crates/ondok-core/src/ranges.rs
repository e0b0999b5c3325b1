//! Score range table and grade resolution.
//!
//! Maps a reading index to a grade label by scanning authored ranges in
//! order. The first range whose inclusive bounds contain the index wins;
//! overlaps and gaps are not checked.

use std::fmt;

use camino::Utf8Path;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{TableError, TableResult};
use crate::tables::{self, Records};

/// Accepted header spellings for the range column.
const RANGE_HEADERS: &[&str] = &["온독지수 범위", "score range", "range"];

/// Accepted header spellings for the label column.
const LABEL_HEADERS: &[&str] = &["대상 학년", "target grade", "label"];

/// Label shown when no range contains the index.
pub const OUT_OF_RANGE_LABEL: &str = "범위 외";

/// Label shown when the text has no tool words.
pub const NO_MATCHES_LABEL: &str = "사고도구어가 발견되지 않았어요";

/// One inclusive index bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreRange {
    /// Lower bound (inclusive).
    pub min: i64,
    /// Upper bound (inclusive).
    pub max: i64,
    /// Grade-level description.
    pub label: String,
}

impl ScoreRange {
    /// Create a range. Returns `None` when `min > max`.
    pub fn new(min: i64, max: i64, label: impl Into<String>) -> Option<Self> {
        (min <= max).then(|| Self {
            min,
            max,
            label: label.into(),
        })
    }

    /// Whether `index` falls inside the bounds.
    #[allow(clippy::cast_precision_loss)]
    pub fn contains(&self, index: f64) -> bool {
        self.min as f64 <= index && index <= self.max as f64
    }
}

/// Parse a `"<min>~<max>"` cell.
pub fn parse_bounds(cell: &str) -> Result<(i64, i64), String> {
    let (lo, hi) = cell
        .split_once('~')
        .ok_or_else(|| format!("expected '<min>~<max>', got '{cell}'"))?;
    let min = lo
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("range minimum is not an integer: '{}'", lo.trim()))?;
    let max = hi
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("range maximum is not an integer: '{}'", hi.trim()))?;
    if min > max {
        return Err(format!("range minimum {min} exceeds maximum {max}"));
    }
    Ok((min, max))
}

/// Outcome of resolving an index to a grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "label", rename_all = "snake_case")]
pub enum GradeLabel {
    /// A range matched.
    Resolved(String),
    /// The index fell outside every range.
    OutOfRange,
    /// No tool words were found, so nothing was resolved.
    NoMatches,
}

impl GradeLabel {
    /// Display text for the label.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Resolved(label) => label,
            Self::OutOfRange => OUT_OF_RANGE_LABEL,
            Self::NoMatches => NO_MATCHES_LABEL,
        }
    }

    /// Whether a range matched.
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

impl fmt::Display for GradeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, immutable list of score ranges.
#[derive(Debug, Clone, Default)]
pub struct ScoreRangeTable {
    ranges: Vec<ScoreRange>,
}

impl ScoreRangeTable {
    /// Build a table from ranges, preserving their order.
    pub fn new(ranges: Vec<ScoreRange>) -> Self {
        Self { ranges }
    }

    /// Load a score range CSV file.
    #[tracing::instrument]
    pub fn load(path: &Utf8Path) -> TableResult<Self> {
        let text = tables::read_table(path)?;
        let table = Self::parse(&text)?;
        tracing::info!(ranges = table.len(), "score ranges loaded");
        Ok(table)
    }

    /// Parse CSV text with `온독지수 범위` and `대상 학년` columns.
    pub fn parse(text: &str) -> TableResult<Self> {
        let records = Records::parse(text)?;
        let range_col = records.column("score range", RANGE_HEADERS)?;
        let label_col = records.column("target grade", LABEL_HEADERS)?;

        let mut ranges = Vec::new();
        for (line, cells) in records.rows() {
            let (min, max) = parse_bounds(tables::cell(cells, range_col, line)?)
                .map_err(|message| TableError::InvalidRow { line, message })?;
            let label = tables::cell(cells, label_col, line)?.to_string();
            ranges.push(ScoreRange { min, max, label });
        }
        Ok(Self::new(ranges))
    }

    /// Resolve `index` to the first containing range.
    pub fn resolve(&self, index: f64) -> GradeLabel {
        self.ranges
            .iter()
            .find(|r| r.contains(index))
            .map_or(GradeLabel::OutOfRange, |r| GradeLabel::Resolved(r.label.clone()))
    }

    /// Ranges in table order.
    pub fn ranges(&self) -> &[ScoreRange] {
        &self.ranges
    }

    /// Number of ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
