//! Score command: match a passage against the vocabulary and compute its index.

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Args;
use tracing::{debug, instrument};

use ondok_core::config::{Config, ConfigSources};
use ondok_core::matcher::MatchMode;
use ondok_core::pipeline::{self, ScoreOptions};
use ondok_core::scoring::ScoringStrategy;

use super::{TableArgs, load_tables, print_report, read_input_file};

/// Arguments for the `score` subcommand.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Text file to score (`-` for stdin).
    pub file: Utf8PathBuf,

    /// Scoring strategy.
    #[arg(long, value_enum)]
    pub strategy: Option<ScoringStrategy>,

    /// How the text is matched against the vocabulary.
    #[arg(long, value_enum)]
    pub match_mode: Option<MatchMode>,

    /// Report `ratio-of-max` and `cttr` indexes above 280 as-is.
    #[arg(long)]
    pub no_clamp: bool,

    #[command(flatten)]
    pub tables: TableArgs,
}

impl ScoreArgs {
    fn options(&self, config: &Config) -> ScoreOptions {
        let base = ScoreOptions::from_config(config);
        ScoreOptions {
            strategy: self.strategy.unwrap_or(base.strategy),
            match_mode: self.match_mode.unwrap_or(base.match_mode),
            clamp: base.clamp && !self.no_clamp,
        }
    }
}

/// Score a passage read from a file or stdin.
#[instrument(name = "cmd_score", skip_all, fields(file = %args.file))]
pub fn cmd_score(
    args: ScoreArgs,
    global_json: bool,
    config: &Config,
    sources: &ConfigSources,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    let options = args.options(config);
    debug!(?options, "executing score command");

    let content = read_input_file(&args.file, max_input_bytes)?;
    let tables = load_tables(config, sources, &args.tables)?;

    let report = pipeline::analyze_text(&tables, &content, options)
        .with_context(|| format!("failed to score {}", args.file))?;

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}
