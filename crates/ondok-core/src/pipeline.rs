//! End-to-end analysis: text in, reading report out.
//!
//! [`Tables`] holds the vocabulary and score ranges, loaded once and then
//! only read. [`analyze_text`] scores a passage directly;
//! [`analyze_extraction`] scores the pairs a generative model claims to have
//! found, after reconciling them against the vocabulary.

use camino::Utf8Path;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AnalysisError, AnalysisResult, TableResult};
use crate::extraction::{self, Rejection, SkippedLine};
use crate::matcher::{self, MatchMode, MatchSet, MatchedWord};
use crate::ranges::{GradeLabel, ScoreRangeTable};
use crate::scoring::{Precision, ScoreDiagnostics, ScoringStrategy};
use crate::vocab::VocabTable;

/// Vocabulary and score ranges shared by every request.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    /// Tool words and their grades.
    pub vocab: VocabTable,
    /// Index buckets and their labels.
    pub ranges: ScoreRangeTable,
}

impl Tables {
    /// Bundle already-built tables.
    pub const fn new(vocab: VocabTable, ranges: ScoreRangeTable) -> Self {
        Self { vocab, ranges }
    }

    /// Load both tables from CSV files.
    #[tracing::instrument(fields(vocab = %vocab, ranges = %ranges))]
    pub fn load(vocab: &Utf8Path, ranges: &Utf8Path) -> TableResult<Self> {
        let tables = Self::new(VocabTable::load(vocab)?, ScoreRangeTable::load(ranges)?);
        tracing::info!(
            words = tables.vocab.len(),
            ranges = tables.ranges.len(),
            "tables loaded"
        );
        Ok(tables)
    }
}

/// Per-request scoring choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreOptions {
    /// Scoring algorithm.
    pub strategy: ScoringStrategy,
    /// Text matching policy.
    pub match_mode: MatchMode,
    /// Clamp `ratio-of-max` and `cttr` to the index ceiling.
    pub clamp: bool,
}

impl Default for ScoreOptions {
    fn default() -> Self {
        Self {
            strategy: ScoringStrategy::default(),
            match_mode: MatchMode::default(),
            clamp: true,
        }
    }
}

impl ScoreOptions {
    /// Direct-text options from configuration.
    pub const fn from_config(config: &Config) -> Self {
        Self {
            strategy: config.strategy,
            match_mode: config.match_mode,
            clamp: config.clamp_index,
        }
    }

    /// Options for reconciled model output.
    pub const fn for_extraction(config: &Config) -> Self {
        Self {
            strategy: config.extraction_strategy,
            match_mode: config.match_mode,
            clamp: config.clamp_index,
        }
    }
}

/// Outcome of scoring one passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReadingReport {
    /// Reading index, rounded per strategy.
    pub index: f64,
    /// Rounding applied to `index`.
    pub precision: Precision,
    /// Estimated school grade.
    pub grade: GradeLabel,
    /// Strategy that produced the index.
    pub strategy: ScoringStrategy,
    /// Matched words with counts and weights.
    pub matches: Vec<MatchedWord>,
    /// Intermediate values.
    pub diagnostics: ScoreDiagnostics,
}

impl ReadingReport {
    /// The index formatted per its precision (`122`, `187.3`).
    pub fn display_index(&self) -> String {
        match self.precision {
            Precision::Integer => format!("{:.0}", self.index),
            Precision::OneDecimal => format!("{:.1}", self.index),
        }
    }
}

/// A report for model-extracted pairs, with what was thrown away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractionReport {
    /// Score of the accepted pairs.
    pub report: ReadingReport,
    /// Pairs that did not match a vocabulary row.
    pub rejected: Vec<Rejection>,
    /// Repeated accepted pairs that were collapsed.
    pub duplicates: usize,
    /// Response lines that held no usable pair.
    pub skipped: Vec<SkippedLine>,
}

/// Fail with [`AnalysisError::InputTooLarge`] when `size` exceeds `limit`.
pub const fn check_input_size(size: usize, limit: Option<usize>) -> AnalysisResult<()> {
    match limit {
        Some(limit) if size > limit => Err(AnalysisError::InputTooLarge { size, limit }),
        _ => Ok(()),
    }
}

/// Match `text` against the vocabulary and score it.
///
/// Blank text is an error. Text without any tool word scores 0 with
/// [`GradeLabel::NoMatches`].
#[tracing::instrument(skip(tables, text), fields(text_len = text.len(), strategy = %options.strategy))]
pub fn analyze_text(
    tables: &Tables,
    text: &str,
    options: ScoreOptions,
) -> AnalysisResult<ReadingReport> {
    if text.trim().is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    let matches = matcher::match_text(text, &tables.vocab, options.match_mode);
    Ok(score_matches(tables, &matches, text, options))
}

/// Reconcile a model response against the vocabulary and score the result.
///
/// `text` is the passage the model was given; it only feeds the token count
/// used by the density-based strategies. Blank text is an error, whatever
/// the response holds.
#[tracing::instrument(skip(tables, text, response), fields(response_len = response.len(), strategy = %options.strategy))]
pub fn analyze_extraction(
    tables: &Tables,
    text: &str,
    response: &str,
    options: ScoreOptions,
) -> AnalysisResult<ExtractionReport> {
    if text.trim().is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    let parsed = extraction::parse_extraction(response);
    let reconciled = extraction::reconcile(parsed, &tables.vocab);
    tracing::debug!(
        accepted = reconciled.matches.total(),
        rejected = reconciled.rejected.len(),
        skipped = reconciled.skipped.len(),
        "extraction reconciled"
    );
    Ok(ExtractionReport {
        report: score_matches(tables, &reconciled.matches, text, options),
        rejected: reconciled.rejected,
        duplicates: reconciled.duplicates,
        skipped: reconciled.skipped,
    })
}

/// Resolve an index against the range table.
///
/// Bounds are inclusive and compared as given: with bands `0~139` and
/// `140~219`, 139.6 falls in neither and resolves to
/// [`GradeLabel::OutOfRange`].
pub fn resolve_grade(ranges: &ScoreRangeTable, index: f64) -> GradeLabel {
    ranges.resolve(index)
}

fn score_matches(
    tables: &Tables,
    matches: &MatchSet,
    text: &str,
    options: ScoreOptions,
) -> ReadingReport {
    let breakdown = options.strategy.compute(matches, text, options.clamp);
    let grade = if matches.is_empty() {
        GradeLabel::NoMatches
    } else {
        resolve_grade(&tables.ranges, breakdown.bounded_index)
    };
    tracing::info!(index = breakdown.index, grade = %grade, "passage scored");

    ReadingReport {
        index: breakdown.index,
        precision: options.strategy.precision(),
        grade,
        strategy: breakdown.strategy,
        matches: matches.summary(),
        diagnostics: breakdown.diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranges::ScoreRange;
    use crate::vocab::{Grade, VocabEntry};

    fn tables() -> Tables {
        Tables::new(
            VocabTable::from_entries([
                VocabEntry::new("분석", Grade::One),
                VocabEntry::new("추론", Grade::Two),
                VocabEntry::new("비교", Grade::Three),
                VocabEntry::new("원인", Grade::Four),
            ]),
            ScoreRangeTable::new(vec![
                ScoreRange::new(0, 139, "G1").unwrap(),
                ScoreRange::new(140, 219, "G2").unwrap(),
                ScoreRange::new(220, 280, "G3").unwrap(),
            ]),
        )
    }

    fn opts(strategy: ScoringStrategy) -> ScoreOptions {
        ScoreOptions {
            strategy,
            ..ScoreOptions::default()
        }
    }

    #[test]
    fn blank_text_is_an_error() {
        let err = analyze_text(&tables(), "  \n\t", ScoreOptions::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput));
    }

    #[test]
    fn no_matches_scores_zero_for_every_strategy() {
        for strategy in ScoringStrategy::ALL {
            let report = analyze_text(&tables(), "오늘은 날씨가 맑다", opts(strategy)).unwrap();
            assert_eq!(report.index, 0.0, "{strategy}");
            assert_eq!(report.grade, GradeLabel::NoMatches, "{strategy}");
            assert!(report.matches.is_empty());
        }
    }

    #[test]
    fn weighted_fraction_resolves_grade() {
        // base weights 4 + 3 = 7 over 4 × 2 = 8 → 245
        let report = analyze_text(
            &tables(),
            "분석 그리고 추론",
            opts(ScoringStrategy::WeightedFraction),
        )
        .unwrap();
        assert_eq!(report.index, 245.0);
        assert_eq!(report.display_index(), "245");
        assert_eq!(report.grade, GradeLabel::Resolved("G3".into()));
        assert_eq!(report.matches.len(), 2);
    }

    #[test]
    fn extraction_path_scores_only_reconciled_pairs() {
        let response = "분석/1\n추론/3\n없는말/2\n그냥 설명하는 문장\n";
        let report = analyze_extraction(
            &tables(),
            "분석과 추론",
            response,
            opts(ScoringStrategy::WeightedFraction),
        )
        .unwrap();
        // only 분석/1 survives: 4 / 4 × 280
        assert_eq!(report.report.index, 280.0);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn failed_extraction_text_yields_no_matches() {
        let report = analyze_extraction(
            &tables(),
            "분석",
            crate::collaborator::EXTRACTION_FAILED,
            ScoreOptions::default(),
        )
        .unwrap();
        assert_eq!(report.report.grade, GradeLabel::NoMatches);
        assert_eq!(report.report.index, 0.0);
    }

    #[test]
    fn blank_passage_is_an_error_on_the_extraction_path() {
        for text in ["", "   ", "\n\t"] {
            let err = analyze_extraction(&tables(), text, "분석/1", ScoreOptions::default())
                .unwrap_err();
            assert!(matches!(err, AnalysisError::EmptyInput));
        }
    }

    #[test]
    fn empty_response_scores_nothing_and_skips_nothing() {
        let report = analyze_extraction(&tables(), "분석", "", ScoreOptions::default()).unwrap();
        assert_eq!(report.report.grade, GradeLabel::NoMatches);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn fractional_index_in_a_gap_is_out_of_range() {
        let ranges = tables().ranges;
        assert_eq!(resolve_grade(&ranges, 139.6), GradeLabel::OutOfRange);
        assert_eq!(resolve_grade(&ranges, 139.0), GradeLabel::Resolved("G1".into()));
        assert_eq!(resolve_grade(&ranges, 140.0), GradeLabel::Resolved("G2".into()));
        assert_eq!(resolve_grade(&ranges, 281.0), GradeLabel::OutOfRange);
    }

    #[test]
    fn grade_follows_the_unrounded_index() {
        let tables = Tables::new(
            tables().vocab,
            ScoreRangeTable::new(vec![
                ScoreRange::new(0, 233, "A").unwrap(),
                ScoreRange::new(234, 280, "B").unwrap(),
            ]),
        );
        // 4 + 3 + 3 over 4 × 3 → 233.33…, displayed as 233
        let report = analyze_text(
            &tables,
            "분석 추론 추론",
            opts(ScoringStrategy::WeightedFraction),
        )
        .unwrap();
        assert_eq!(report.display_index(), "233");
        assert_eq!(report.grade, GradeLabel::OutOfRange);
    }

    #[test]
    fn unclamped_index_can_leave_every_range() {
        let options = ScoreOptions {
            strategy: ScoringStrategy::Cttr,
            match_mode: MatchMode::Token,
            clamp: false,
        };
        // one grade-1 word and nothing else overshoots the ceiling
        let report = analyze_text(&tables(), "분석", options).unwrap();
        assert!(report.index > 280.0);
        assert_eq!(report.grade, GradeLabel::OutOfRange);
    }

    #[test]
    fn input_size_check() {
        assert!(check_input_size(10, Some(10)).is_ok());
        assert!(check_input_size(10, None).is_ok());
        assert!(matches!(
            check_input_size(11, Some(10)),
            Err(AnalysisError::InputTooLarge { size: 11, limit: 10 })
        ));
    }

    #[test]
    fn options_follow_config() {
        let config = Config {
            strategy: ScoringStrategy::Density,
            clamp_index: false,
            ..Config::default()
        };
        let direct = ScoreOptions::from_config(&config);
        assert_eq!(direct.strategy, ScoringStrategy::Density);
        assert!(!direct.clamp);
        let extracted = ScoreOptions::for_extraction(&config);
        assert_eq!(extracted.strategy, ScoringStrategy::WeightedFraction);
    }
}
