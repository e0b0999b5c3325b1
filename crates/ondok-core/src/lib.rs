//! Core library for ondok.
//!
//! Estimates a Korean reading index (온독지수, nominally 0–280) from the
//! cognitive tool words (사고도구어) a passage uses, then maps it to a
//! school-grade label.
//!
//! # Modules
//!
//! - [`vocab`] - Graded tool-word table
//! - [`ranges`] - Index ranges and grade resolution
//! - [`tables`] - CSV reading with encoding fallback
//! - [`text`] - Tokenizing
//! - [`matcher`] - Matching text against the vocabulary
//! - [`scoring`] - Index strategies
//! - [`extraction`] - Parsing and reconciling model responses
//! - [`collaborator`] - Generative-model and OCR clients
//! - [`pipeline`] - End-to-end analysis
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```no_run
//! use camino::Utf8Path;
//! use ondok_core::{ScoreOptions, Tables, analyze_text};
//!
//! let tables = Tables::load(Utf8Path::new("words.csv"), Utf8Path::new("ranges.csv"))
//!     .expect("Failed to load tables");
//! let report = analyze_text(&tables, "원인을 분석하고 결과를 추론한다", ScoreOptions::default())
//!     .expect("Failed to analyze");
//!
//! println!("{} ({})", report.display_index(), report.grade);
//! ```
#![deny(unsafe_code)]

pub mod collaborator;
pub mod config;
pub mod error;
pub mod extraction;
pub mod matcher;
pub mod pipeline;
pub mod ranges;
pub mod scoring;
pub mod tables;
pub mod text;
pub mod vocab;

pub use config::{CollaboratorConfig, Config, ConfigLoader, ConfigSources, LogLevel};
pub use error::{
    AnalysisError, AnalysisResult, CollaboratorError, CollaboratorResult, ConfigError,
    ConfigResult, TableError, TableResult,
};
pub use matcher::{MatchMode, MatchSet};
pub use pipeline::{
    ExtractionReport, ReadingReport, ScoreOptions, Tables, analyze_extraction, analyze_text,
};
pub use ranges::{GradeLabel, ScoreRange, ScoreRangeTable};
pub use scoring::ScoringStrategy;
pub use vocab::{Grade, VocabEntry, VocabTable};
