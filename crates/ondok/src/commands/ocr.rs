//! OCR command: recognize text in an image, optionally scoring it.

use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use ondok_core::collaborator::{self, OpenAiClient};
use ondok_core::config::{Config, ConfigSources};
use ondok_core::pipeline::{self, ReadingReport, ScoreOptions};

use super::{TableArgs, load_tables, print_report, read_input_bytes};

/// Arguments for the `ocr` subcommand.
#[derive(Args, Debug)]
pub struct OcrArgs {
    /// Image file (PNG, JPEG, GIF, WebP).
    pub image: Utf8PathBuf,

    /// Score the recognized text.
    #[arg(long)]
    pub score: bool,

    #[command(flatten)]
    pub tables: TableArgs,
}

#[derive(Serialize)]
struct OcrOutput {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<ReadingReport>,
}

/// Recognize the text in an image.
///
/// Recognition failures yield empty text rather than an error.
#[instrument(name = "cmd_ocr", skip_all, fields(image = %args.image))]
pub fn cmd_ocr(
    args: OcrArgs,
    global_json: bool,
    config: &Config,
    sources: &ConfigSources,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    debug!(score = args.score, "executing ocr command");

    let image = read_input_bytes(&args.image, max_input_bytes)?;
    let text = match OpenAiClient::from_config(&config.collaborator) {
        Ok(client) => collaborator::recognize_or_empty(&client, &image),
        Err(e) => {
            warn!(error = %e, "recognizer unavailable");
            String::new()
        }
    };

    // Empty text has nothing to score; report it rather than erroring.
    let report = if args.score && !text.trim().is_empty() {
        let tables = load_tables(config, sources, &args.tables)?;
        Some(pipeline::analyze_text(
            &tables,
            &text,
            ScoreOptions::from_config(config),
        )?)
    } else {
        None
    };

    if global_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&OcrOutput { text, report })?
        );
        return Ok(());
    }

    if text.is_empty() {
        eprintln!("{} no text recognized", "warning:".yellow().bold());
    } else {
        println!("{text}");
    }
    if let Some(ref report) = report {
        println!();
        print_report(report);
    }
    Ok(())
}
