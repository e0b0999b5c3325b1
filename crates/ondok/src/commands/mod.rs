//! Command implementations.

use std::io::Read;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use owo_colors::OwoColorize;

use ondok_core::config::{self, Config, ConfigSources};
use ondok_core::pipeline::{ReadingReport, Tables};
use ondok_core::ranges::ScoreRangeTable;
use ondok_core::tables;
use ondok_core::vocab::VocabTable;

pub mod extract;
pub mod grade;
pub mod info;
pub mod ocr;
pub mod score;
#[cfg(feature = "mcp")]
pub mod serve;
pub mod vocab;

/// Table location overrides shared by the scoring commands.
#[derive(Args, Debug, Default, Clone)]
pub struct TableArgs {
    /// Vocabulary CSV (overrides `vocabulary` from config).
    #[arg(long, value_name = "FILE")]
    pub vocab: Option<Utf8PathBuf>,

    /// Score range CSV (overrides `score_ranges` from config).
    #[arg(long, value_name = "FILE")]
    pub ranges: Option<Utf8PathBuf>,
}

/// Read raw bytes from a file, or stdin for `-`, enforcing the size limit.
pub fn read_input_bytes(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<Vec<u8>> {
    if path == "-" {
        let mut buf = Vec::new();
        let mut stdin = std::io::stdin().lock();
        match max_bytes {
            // One byte past the limit is enough to detect overflow.
            Some(max) => (&mut stdin).take(max as u64 + 1).read_to_end(&mut buf),
            None => stdin.read_to_end(&mut buf),
        }
        .context("failed to read stdin")?;
        if let Some(max) = max_bytes
            && buf.len() > max
        {
            anyhow::bail!("input too large: stdin exceeds {max} bytes");
        }
        return Ok(buf);
    }

    // Preflight: check file size via metadata before reading into memory.
    let metadata =
        std::fs::metadata(path.as_std_path()).with_context(|| format!("failed to read {path}"))?;
    if let Some(max) = max_bytes {
        let size = metadata.len() as usize;
        if size > max {
            anyhow::bail!("input too large: {path} is {size} bytes (limit: {max} bytes)");
        }
    }

    std::fs::read(path.as_std_path()).with_context(|| format!("failed to read {path}"))
}

/// Read a text file (or stdin) and decode it as UTF-8, falling back to EUC-KR.
pub fn read_input_file(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<String> {
    let bytes = read_input_bytes(path, max_bytes)?;
    Ok(tables::decode_bytes(&bytes).into_owned())
}

/// Resolve a table path: CLI flag as given, config value relative to its file.
fn table_path(
    flag: Option<&Utf8PathBuf>,
    configured: Option<&Utf8PathBuf>,
    sources: &ConfigSources,
    (flag_name, key): (&str, &str),
) -> anyhow::Result<Utf8PathBuf> {
    if let Some(path) = flag {
        return Ok(path.clone());
    }
    let path = configured.with_context(|| {
        format!("no {key} table configured: pass --{flag_name} or set `{key}` in the config file")
    })?;
    Ok(match sources.base_dir() {
        Some(dir) => config::resolve_path(path, dir),
        None => path.clone(),
    })
}

/// Load only the vocabulary table.
pub fn load_vocab(
    config: &Config,
    sources: &ConfigSources,
    args: &TableArgs,
) -> anyhow::Result<VocabTable> {
    let path = table_path(
        args.vocab.as_ref(),
        config.vocabulary.as_ref(),
        sources,
        ("vocab", "vocabulary"),
    )?;
    VocabTable::load(&path).with_context(|| format!("failed to load vocabulary from {path}"))
}

/// Load only the score range table.
pub fn load_ranges(
    config: &Config,
    sources: &ConfigSources,
    args: &TableArgs,
) -> anyhow::Result<ScoreRangeTable> {
    let path = table_path(
        args.ranges.as_ref(),
        config.score_ranges.as_ref(),
        sources,
        ("ranges", "score_ranges"),
    )?;
    ScoreRangeTable::load(&path).with_context(|| format!("failed to load score ranges from {path}"))
}

/// Load both tables.
pub fn load_tables(
    config: &Config,
    sources: &ConfigSources,
    args: &TableArgs,
) -> anyhow::Result<Tables> {
    Ok(Tables::new(
        load_vocab(config, sources, args)?,
        load_ranges(config, sources, args)?,
    ))
}

/// Print a reading report as text.
pub fn print_report(report: &ReadingReport) {
    println!(
        "{}: {} ({})",
        "온독지수".bold(),
        report.display_index().green(),
        report.strategy.dimmed()
    );
    if report.grade.is_resolved() {
        println!("{}: {}", "대상 학년".bold(), report.grade.cyan());
    } else {
        println!("{}: {}", "대상 학년".bold(), report.grade.yellow());
    }

    if report.matches.is_empty() {
        return;
    }
    println!();
    println!("{}", "사고도구어".bold().underline());
    for m in &report.matches {
        println!(
            "  {}  {}등급  {}  ×{}",
            m.word,
            m.grade,
            format!("{:.2}", m.weight).dimmed(),
            m.count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn utf8(path: std::path::PathBuf) -> Utf8PathBuf {
        Utf8PathBuf::try_from(path).unwrap()
    }

    #[test]
    fn read_input_file_rejects_oversized_file() {
        let tmp = TempDir::new().unwrap();
        let path = utf8(tmp.path().join("big.txt"));
        fs::write(&path, "분석 ".repeat(100)).unwrap();
        let err = read_input_file(&path, Some(10)).unwrap_err();
        assert!(err.to_string().contains("input too large"));
    }

    #[test]
    fn read_input_file_decodes_euc_kr() {
        let tmp = TempDir::new().unwrap();
        let path = utf8(tmp.path().join("euckr.txt"));
        // "분석" in EUC-KR
        fs::write(&path, [0xBA, 0xD0, 0xBC, 0xAE]).unwrap();
        assert_eq!(read_input_file(&path, None).unwrap(), "분석");
    }

    #[test]
    fn flag_path_wins_over_config() {
        let sources = ConfigSources::default();
        let flag = Utf8PathBuf::from("cli.csv");
        let configured = Utf8PathBuf::from("cfg.csv");
        let path = table_path(
            Some(&flag),
            Some(&configured),
            &sources,
            ("vocab", "vocabulary"),
        )
        .unwrap();
        assert_eq!(path, flag);
    }

    #[test]
    fn config_path_resolves_against_config_file() {
        let sources = ConfigSources {
            explicit_files: vec![Utf8PathBuf::from("/etc/ondok/config.toml")],
            ..ConfigSources::default()
        };
        let configured = Utf8PathBuf::from("words.csv");
        let path = table_path(None, Some(&configured), &sources, ("vocab", "vocabulary")).unwrap();
        assert_eq!(path, Utf8PathBuf::from("/etc/ondok/words.csv"));
    }

    #[test]
    fn missing_table_is_reported() {
        let err = table_path(
            None,
            None,
            &ConfigSources::default(),
            ("ranges", "score_ranges"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("--ranges"));
    }
}
