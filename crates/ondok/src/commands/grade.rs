//! Grade command: map a reading index to its grade label.

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use ondok_core::config::{Config, ConfigSources};
use ondok_core::pipeline;
use ondok_core::ranges::GradeLabel;

use super::{TableArgs, load_ranges};

/// Arguments for the `grade` subcommand.
#[derive(Args, Debug)]
pub struct GradeArgs {
    /// Reading index to resolve.
    #[arg(allow_negative_numbers = true)]
    pub index: f64,

    #[command(flatten)]
    pub tables: TableArgs,
}

#[derive(Serialize)]
struct GradeOutput {
    index: f64,
    grade: GradeLabel,
}

/// Resolve an index against the score range table.
#[instrument(name = "cmd_grade", skip_all, fields(index = args.index))]
pub fn cmd_grade(
    args: GradeArgs,
    global_json: bool,
    config: &Config,
    sources: &ConfigSources,
) -> anyhow::Result<()> {
    debug!("executing grade command");

    let ranges = load_ranges(config, sources, &args.tables)?;
    let grade = pipeline::resolve_grade(&ranges, args.index);

    if global_json {
        let output = GradeOutput {
            index: args.index,
            grade,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if grade.is_resolved() {
        println!("{}", grade.cyan());
    } else {
        println!("{}", grade.yellow());
    }
    Ok(())
}
