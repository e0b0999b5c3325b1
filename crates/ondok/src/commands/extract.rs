//! Extract command: ask a generative model for the tool words in a passage,
//! reconcile its answer against the vocabulary, and score what survives.

use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use ondok_core::collaborator::{self, Extraction, OpenAiClient};
use ondok_core::config::{Config, ConfigSources};
use ondok_core::error::AnalysisError;
use ondok_core::pipeline::{self, ExtractionReport, ScoreOptions, Tables};
use ondok_core::scoring::ScoringStrategy;

use super::{TableArgs, load_tables, print_report, read_input_file};

/// Arguments for the `extract` subcommand.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Text file to analyze (`-` for stdin).
    pub file: Utf8PathBuf,

    /// Use a saved model response instead of calling the service.
    #[arg(long, value_name = "FILE")]
    pub response: Option<Utf8PathBuf>,

    /// Scoring strategy for the reconciled words.
    #[arg(long, value_enum)]
    pub strategy: Option<ScoringStrategy>,

    /// Print the prompt that would be sent and exit.
    #[arg(long)]
    pub print_prompt: bool,

    #[command(flatten)]
    pub tables: TableArgs,
}

#[derive(Serialize)]
struct ExtractOutput<'a> {
    /// `false` when the service call failed and the fallback text was used.
    extracted: bool,
    response: &'a str,
    #[serde(flatten)]
    result: &'a ExtractionReport,
}

/// Run the generative-model path end to end.
#[instrument(name = "cmd_extract", skip_all, fields(file = %args.file))]
pub fn cmd_extract(
    args: ExtractArgs,
    global_json: bool,
    config: &Config,
    sources: &ConfigSources,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    debug!(response = ?args.response, "executing extract command");

    let content = read_input_file(&args.file, max_input_bytes)?;
    if content.trim().is_empty() {
        return Err(AnalysisError::EmptyInput.into());
    }
    let tables = load_tables(config, sources, &args.tables)?;

    if args.print_prompt {
        println!("{}", collaborator::build_prompt(&tables.vocab, &content));
        return Ok(());
    }

    let extraction = match args.response {
        Some(ref path) => Extraction::Response(read_input_file(path, max_input_bytes)?),
        None => call_service(config, &tables, &content, global_json),
    };

    let mut options = ScoreOptions::for_extraction(config);
    if let Some(strategy) = args.strategy {
        options.strategy = strategy;
    }
    // The fallback placeholder is not model output; nothing to parse.
    let response = match extraction {
        Extraction::Response(ref text) => text.as_str(),
        Extraction::Failed { .. } => "",
    };
    let result = pipeline::analyze_extraction(&tables, &content, response, options)?;

    if global_json {
        let output = ExtractOutput {
            extracted: matches!(extraction, Extraction::Response(_)),
            response: extraction.display_text(),
            result: &result,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Extraction::Failed { ref message } = extraction {
        eprintln!("{} {}", "warning:".yellow().bold(), message);
    }
    print_report(&result.report);

    if !result.rejected.is_empty() {
        println!();
        println!("{}", "Rejected".bold().underline());
        for r in &result.rejected {
            println!(
                "  {}/{}  {}",
                r.candidate.word,
                r.candidate.grade,
                format!("{:?}", r.reason).dimmed()
            );
        }
    }
    if !result.skipped.is_empty() {
        println!();
        println!(
            "{}",
            format!("{} unparsed response lines", result.skipped.len()).dimmed()
        );
    }

    Ok(())
}

fn call_service(config: &Config, tables: &Tables, text: &str, quiet_ui: bool) -> Extraction {
    let client = match OpenAiClient::from_config(&config.collaborator) {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "extractor unavailable, using fallback");
            return Extraction::Failed {
                message: e.to_string(),
            };
        }
    };

    let spinner = if quiet_ui {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("asking {}…", config.collaborator.model));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };
    let extraction = collaborator::extract_or_fallback(&client, text, &tables.vocab);
    spinner.finish_and_clear();
    extraction
}
