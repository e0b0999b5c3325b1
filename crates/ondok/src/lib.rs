//! Library interface for the `ondok` CLI.
//!
//! This crate exposes the CLI's argument parser and command structure as a library,
//! primarily for documentation generation and testing. The actual entry point is
//! in `main.rs`.
//!
//! # Structure
//!
//! - [`Cli`] - The root argument parser (clap derive)
//! - [`Commands`] - Available subcommands
//! - [`commands`] - Command implementations

pub mod commands;

#[cfg(feature = "mcp")]
pub mod server;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Configure global color output based on this choice.
    ///
    /// Call this once at startup to set the color mode.
    pub fn apply(self) {
        match self {
            Self::Auto => {} // owo-colors auto-detects by default
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG                 Log filter (e.g., debug, ondok_core=trace)
    ONDOK_LOG_PATH           Explicit log file path
    ONDOK_LOG_DIR            Log directory
    ONDOK_VOCABULARY         Vocabulary CSV path
    ONDOK_SCORE_RANGES       Score range CSV path
    ONDOK_STRATEGY           Scoring strategy (ratio-of-max, density, weighted-fraction, cttr)
    ONDOK_COLLABORATOR__*    Model settings (e.g. ONDOK_COLLABORATOR__MODEL)
    OPENAI_API_KEY           API key for extraction and OCR (name is configurable)
";
/// Command-line interface definition for ondok.
#[derive(Parser)]
#[command(name = "ondok")]
#[command(about = "Korean reading index from cognitive tool words", long_about = None)]
#[command(version, arg_required_else_help = true)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Print only the version number (for scripting)
    #[arg(long)]
    pub version_only: bool,

    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long, global = true)]
    pub chdir: Option<PathBuf>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More detail (repeatable; e.g. -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, global = true, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available subcommands for the CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Score a passage by matching it against the vocabulary
    Score(commands::score::ScoreArgs),

    /// Score the tool words a generative model finds in a passage
    Extract(commands::extract::ExtractArgs),

    /// Recognize text in an image
    Ocr(commands::ocr::OcrArgs),

    /// Resolve a reading index to a grade label
    Grade(commands::grade::GradeArgs),

    /// List the vocabulary or look up one word
    Vocab(commands::vocab::VocabArgs),

    /// Show package information
    Info(commands::info::InfoArgs),

    /// Start MCP (Model Context Protocol) server on stdio
    #[cfg(feature = "mcp")]
    Serve(commands::serve::ServeArgs),
}

/// Returns the clap command for documentation generation
pub fn command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        command().debug_assert();
    }

    #[test]
    fn score_accepts_strategy_flag() {
        let cli = Cli::try_parse_from(["ondok", "score", "a.txt", "--strategy", "density"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Score(_))));
    }
}
