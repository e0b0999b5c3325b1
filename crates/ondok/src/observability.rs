//! Logging setup: human-readable stderr plus a JSONL file.
//!
//! The file goes to, in order of preference:
//! 1. `ONDOK_LOG_PATH` (exact file, never rotated)
//! 2. `ONDOK_LOG_DIR` (daily rotated `ondok.<date>.jsonl`)
//! 3. `log_dir` from configuration
//! 4. the platform data directory (`~/.local/share/ondok/logs` on Linux)
//!
//! If no location is writable, only stderr logging is set up.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_PATH_ENV: &str = "ONDOK_LOG_PATH";
const LOG_DIR_ENV: &str = "ONDOK_LOG_DIR";
const LOG_PREFIX: &str = "ondok";

/// Where the JSONL log file is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// A single file, never rotated.
    File(PathBuf),
    /// A directory with daily rotation.
    Directory(PathBuf),
    /// No file logging.
    None,
}

/// Resolved logging destinations.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// JSONL destination.
    pub target: LogTarget,
}

impl ObservabilityConfig {
    /// Resolve the log destination from the environment, then `config_dir`,
    /// then the platform default.
    pub fn from_env_with_overrides(config_dir: Option<PathBuf>) -> Self {
        let env_path = std::env::var_os(LOG_PATH_ENV).map(PathBuf::from);
        let env_dir = std::env::var_os(LOG_DIR_ENV).map(PathBuf::from);
        Self::resolve(env_path, env_dir, config_dir, default_log_dir())
    }

    fn resolve(
        env_path: Option<PathBuf>,
        env_dir: Option<PathBuf>,
        config_dir: Option<PathBuf>,
        fallback: Option<PathBuf>,
    ) -> Self {
        let target = match (env_path, env_dir.or(config_dir).or(fallback)) {
            (Some(path), _) => LogTarget::File(path),
            (None, Some(dir)) => LogTarget::Directory(dir),
            (None, None) => LogTarget::None,
        };
        Self { target }
    }
}

fn default_log_dir() -> Option<PathBuf> {
    ondok_core::config::user_data_local_dir().map(|dir| dir.join("logs").into_std_path_buf())
}

/// Build the level filter.
///
/// `RUST_LOG` wins when set. Otherwise `-q` shows errors only, `-v` debug,
/// `-vv` trace, and the configured level applies by default.
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => default_level,
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    EnvFilter::new(level)
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the life of the program so buffered
/// file output is flushed on exit.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
) -> anyhow::Result<Option<WorkerGuard>> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match open_appender(&config.target) {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(guard)
}

fn open_appender(target: &LogTarget) -> Option<RollingFileAppender> {
    let built = match target {
        LogTarget::None => return None,
        LogTarget::File(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let name = path.file_name()?.to_string_lossy().into_owned();
            RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(name)
                .build(dir.unwrap_or_else(|| Path::new(".")))
        }
        LogTarget::Directory(dir) => RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_PREFIX)
            .filename_suffix("jsonl")
            .build(dir),
    };
    // Subscriber is not installed yet, so report on stderr directly.
    built
        .map_err(|e| eprintln!("warning: file logging disabled: {e}"))
        .ok()
}
