//! Reading index computation.
//!
//! Four strategies turn a [`MatchSet`] into an index on a nominal 0–280
//! scale. They are selected at configuration time through
//! [`ScoringStrategy`]:
//!
//! | strategy | formula |
//! |---|---|
//! | `ratio-of-max` | `Σ combined / (n × max combined) × 280` |
//! | `density` | `n / T × mean(STTR) × 500`, clamped |
//! | `weighted-fraction` | `min(280, Σ base / (4n) × 280)` |
//! | `cttr` | `((0.7·cttr + 0.3·w) × 500 + 100) × (0.5 + 0.5·d)`, ×0.6 under 5 tokens |
//!
//! `n` is the number of matched occurrences, `T` the number of tokens in
//! the text, `combined` the base × STTR weight of a grade.
//!
//! `density` and `weighted-fraction` always clamp to the ceiling.
//! `ratio-of-max` and `cttr` clamp only when asked.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::matcher::MatchSet;
use crate::text;
use crate::vocab::MAX_BASE_WEIGHT;

/// Upper bound of the nominal index scale.
pub const INDEX_CEILING: f64 = 280.0;

/// Scale factor of the density strategy.
const DENSITY_SCALE: f64 = 500.0;

/// CTTR strategy: weight of lexical diversity vs. grade weight.
const CTTR_DIVERSITY_SHARE: f64 = 0.7;
const CTTR_WEIGHT_SHARE: f64 = 0.3;
const CTTR_SCALE: f64 = 500.0;
const CTTR_OFFSET: f64 = 100.0;

/// Texts with fewer tokens than this are discounted.
const SHORT_TEXT_TOKENS: usize = 5;
const SHORT_TEXT_FACTOR: f64 = 0.6;

/// Scoring algorithm selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ScoringStrategy {
    /// Sum of combined weights over the best possible sum for the matches.
    RatioOfMax,
    /// Tool-word density scaled by the mean STTR correction.
    Density,
    /// Sum of base weights as a fraction of the maximum.
    WeightedFraction,
    /// Corrected type-token ratio blended with grade weight and density.
    #[default]
    Cttr,
}

/// How an index is rounded for display and grade lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    /// One decimal place.
    OneDecimal,
    /// Whole number, ties to even.
    Integer,
}

impl Precision {
    /// Round `value` at this precision.
    pub fn round(self, value: f64) -> f64 {
        match self {
            Self::OneDecimal => (value * 10.0).round() / 10.0,
            Self::Integer => value.round_ties_even(),
        }
    }
}

impl ScoringStrategy {
    /// All strategies, in historical order.
    pub const ALL: [Self; 4] = [
        Self::RatioOfMax,
        Self::Density,
        Self::WeightedFraction,
        Self::Cttr,
    ];

    /// Returns the strategy as a kebab-case string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RatioOfMax => "ratio-of-max",
            Self::Density => "density",
            Self::WeightedFraction => "weighted-fraction",
            Self::Cttr => "cttr",
        }
    }

    /// Display precision of the index.
    pub const fn precision(&self) -> Precision {
        match self {
            Self::WeightedFraction => Precision::Integer,
            Self::RatioOfMax | Self::Density | Self::Cttr => Precision::OneDecimal,
        }
    }

    /// Whether the formula itself clamps to [0, 280].
    pub const fn always_clamps(&self) -> bool {
        matches!(self, Self::Density | Self::WeightedFraction)
    }

    /// Compute the index for `matches` found in `text`.
    ///
    /// `clamp` bounds the `ratio-of-max` and `cttr` results to [0, 280];
    /// the other strategies clamp regardless.
    #[tracing::instrument(skip(matches, text), fields(strategy = self.as_str(), total = matches.total()))]
    pub fn compute(&self, matches: &MatchSet, text: &str, clamp: bool) -> ScoreBreakdown {
        let token_count = text::count_tokens(text);
        let mut diagnostics = ScoreDiagnostics {
            total: matches.total(),
            distinct: matches.distinct_count(),
            token_count,
            ..ScoreDiagnostics::default()
        };

        if matches.is_empty() {
            return ScoreBreakdown::zero(*self, diagnostics);
        }

        let raw = match self {
            Self::RatioOfMax => ratio_of_max(matches, &mut diagnostics),
            Self::Density => density(matches, token_count, &mut diagnostics),
            Self::WeightedFraction => weighted_fraction(matches, &mut diagnostics),
            Self::Cttr => cttr_index(matches, token_count, &mut diagnostics),
        };

        let bounded = if self.always_clamps() || clamp {
            let b = raw.clamp(0.0, INDEX_CEILING);
            diagnostics.clamped = b != raw;
            b
        } else {
            raw
        };

        let index = self.precision().round(bounded);
        tracing::debug!(raw, index, "index computed");

        ScoreBreakdown {
            strategy: *self,
            raw_index: raw,
            bounded_index: bounded,
            index,
            diagnostics,
        }
    }
}

impl std::fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intermediate values behind an index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreDiagnostics {
    /// Matched occurrences.
    pub total: usize,
    /// Distinct matched words.
    pub distinct: usize,
    /// Word-like tokens in the text.
    pub token_count: usize,
    /// Sum of per-occurrence weights (combined or base, per strategy).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weighted_sum: Option<f64>,
    /// Mean STTR correction (`density`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_sttr: Option<f64>,
    /// Corrected type-token ratio (`cttr`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cttr: Option<f64>,
    /// Normalized grade weight (`cttr`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub norm_weight: Option<f64>,
    /// Matched occurrences per token (`density`, `cttr`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
    /// Whether the short-text discount applied.
    pub short_text_penalty: bool,
    /// Whether clamping changed the value.
    pub clamped: bool,
}

/// Result of scoring one match set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreBreakdown {
    /// Strategy that produced the index.
    pub strategy: ScoringStrategy,
    /// Unclamped, unrounded value.
    pub raw_index: f64,
    /// Value after clamping, before rounding. Grades resolve against this.
    pub bounded_index: f64,
    /// Index after clamping and rounding.
    pub index: f64,
    /// Intermediate values.
    pub diagnostics: ScoreDiagnostics,
}

impl ScoreBreakdown {
    fn zero(strategy: ScoringStrategy, diagnostics: ScoreDiagnostics) -> Self {
        Self {
            strategy,
            raw_index: 0.0,
            bounded_index: 0.0,
            index: 0.0,
            diagnostics,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio_of_max(matches: &MatchSet, diag: &mut ScoreDiagnostics) -> f64 {
    let sum: f64 = matches.grades().map(|g| g.combined_weight()).sum();
    let best = matches
        .grades()
        .map(|g| g.combined_weight())
        .fold(0.0_f64, f64::max);
    diag.weighted_sum = Some(sum);

    let max_score = matches.total() as f64 * best;
    if max_score > 0.0 {
        sum / max_score * INDEX_CEILING
    } else {
        0.0
    }
}

#[allow(clippy::cast_precision_loss)]
fn density(matches: &MatchSet, token_count: usize, diag: &mut ScoreDiagnostics) -> f64 {
    if token_count == 0 {
        return 0.0;
    }
    let total = matches.total() as f64;
    let mean_sttr = matches.grades().map(|g| g.sttr_correction()).sum::<f64>() / total;
    let ratio = total / token_count as f64;
    diag.mean_sttr = Some(mean_sttr);
    diag.density = Some(ratio);

    ratio * mean_sttr * DENSITY_SCALE
}

#[allow(clippy::cast_precision_loss)]
fn weighted_fraction(matches: &MatchSet, diag: &mut ScoreDiagnostics) -> f64 {
    let weighted: u32 = matches.grades().map(|g| g.base_weight()).sum();
    diag.weighted_sum = Some(f64::from(weighted));

    let possible = f64::from(MAX_BASE_WEIGHT) * matches.total() as f64;
    (f64::from(weighted) / possible * INDEX_CEILING).min(INDEX_CEILING)
}

#[allow(clippy::cast_precision_loss)]
fn cttr_index(matches: &MatchSet, token_count: usize, diag: &mut ScoreDiagnostics) -> f64 {
    let total = matches.total() as f64;
    let seen = matches.distinct_count() as f64;
    let weighted: u32 = matches.grades().map(|g| g.base_weight()).sum();

    let cttr = corrected_ttr(seen, total);
    let norm_weight = f64::from(weighted) / (f64::from(MAX_BASE_WEIGHT) * total);
    let dens = if token_count == 0 {
        0.0
    } else {
        total / token_count as f64
    };

    diag.weighted_sum = Some(f64::from(weighted));
    diag.cttr = Some(cttr);
    diag.norm_weight = Some(norm_weight);
    diag.density = Some(dens);

    let blended = CTTR_DIVERSITY_SHARE.mul_add(cttr, CTTR_WEIGHT_SHARE * norm_weight);
    let mut index = blended.mul_add(CTTR_SCALE, CTTR_OFFSET) * 0.5f64.mul_add(dens, 0.5);

    if token_count < SHORT_TEXT_TOKENS {
        index *= SHORT_TEXT_FACTOR;
        diag.short_text_penalty = true;
    }
    index
}

/// `min(types / sqrt(2 × occurrences), 1)`; zero when nothing occurred.
pub fn corrected_ttr(types: f64, occurrences: f64) -> f64 {
    if occurrences <= 0.0 {
        return 0.0;
    }
    (types / (2.0 * occurrences).sqrt()).min(1.0)
}
