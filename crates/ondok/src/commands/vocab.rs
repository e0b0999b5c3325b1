//! Vocab command: list the tool-word table or look up one word.

use anyhow::bail;
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use ondok_core::config::{Config, ConfigSources};
use ondok_core::matcher::MatchedWord;
use ondok_core::vocab::{Grade, VocabEntry};

use super::{TableArgs, load_vocab};

/// Arguments for the `vocab` subcommand.
#[derive(Args, Debug)]
pub struct VocabArgs {
    /// Word to look up. Omit to list the whole table.
    pub word: Option<String>,

    /// Only list words of this grade (1–4).
    #[arg(long)]
    pub grade: Option<Grade>,

    #[command(flatten)]
    pub tables: TableArgs,
}

fn describe(entry: &VocabEntry) -> MatchedWord {
    MatchedWord {
        word: entry.word.clone(),
        grade: entry.grade.as_u8(),
        weight: entry.grade.combined_weight(),
        count: 0,
    }
}

/// List or look up vocabulary entries.
#[instrument(name = "cmd_vocab", skip_all, fields(word = ?args.word))]
pub fn cmd_vocab(
    args: VocabArgs,
    global_json: bool,
    config: &Config,
    sources: &ConfigSources,
) -> anyhow::Result<()> {
    debug!(grade = ?args.grade, "executing vocab command");

    let vocab = load_vocab(config, sources, &args.tables)?;

    let entries: Vec<&VocabEntry> = match args.word {
        Some(ref word) => match vocab.get(word) {
            Some(entry) => vec![entry],
            None => bail!("{word} is not in the vocabulary"),
        },
        None => vocab
            .entries()
            .iter()
            .filter(|e| args.grade.is_none_or(|g| e.grade == g))
            .collect(),
    };

    if global_json {
        let rows: Vec<MatchedWord> = entries.into_iter().map(describe).collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for entry in &entries {
        println!(
            "{}  {}등급  {}",
            entry.word,
            entry.grade,
            format!("{:.2}", entry.grade.combined_weight()).dimmed()
        );
    }
    if args.word.is_none() {
        println!("{}", format!("{} words", entries.len()).dimmed());
    }
    Ok(())
}
