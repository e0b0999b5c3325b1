//! Error types for ondok-core.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading the vocabulary or score range tables.
#[derive(Error, Debug)]
pub enum TableError {
    /// The table file could not be read.
    #[error("failed to read table {path}: {source}")]
    Read {
        /// Path that failed to load.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A required column is missing from the header row.
    #[error("missing column '{column}' (accepted headers: {accepted})")]
    MissingColumn {
        /// Canonical column name.
        column: &'static str,
        /// Comma-separated list of accepted header spellings.
        accepted: String,
    },

    /// A data row could not be parsed.
    #[error("line {line}: {message}")]
    InvalidRow {
        /// 1-based line number in the source.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// The table has a header but no usable rows.
    #[error("table has no rows")]
    Empty,
}

/// Result type alias using [`TableError`].
pub type TableResult<T> = Result<T, TableError>;

/// Errors that can occur during text analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The input text is empty or whitespace only.
    #[error("nothing to analyze: input text is empty")]
    EmptyInput,

    /// The input is larger than the configured limit.
    #[error("input too large: {size} bytes (limit: {limit} bytes)")]
    InputTooLarge {
        /// Input size in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },
}

/// Result type alias using [`AnalysisError`].
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors raised by external collaborators (generative model, OCR).
///
/// These never escape the collaborator boundary: callers go through
/// [`crate::collaborator::extract_or_fallback`] and
/// [`crate::collaborator::recognize_or_empty`], which log and degrade.
#[derive(Error, Debug)]
pub enum CollaboratorError {
    /// No API credential was configured.
    #[error("missing credential: set {env_var}")]
    MissingCredential {
        /// Environment variable expected to hold the key.
        env_var: String,
    },

    /// The HTTP request failed (connect, timeout, TLS, ...).
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message from the body, if any.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Result type alias using [`CollaboratorError`].
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;
