//! Tracing setup
//!
//! Filter comes from `RUST_LOG` (default `warn`). Output goes to stderr,
//! and additionally to `--log-file` when given.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber
///
/// The returned guard flushes the log file on drop; keep it alive for the
/// life of the program.
pub fn init(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let stderr = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let Some(log_file) = log_file else {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(stderr)
            .try_init()
            .context("Failed to initialize tracing")?;
        return Ok(None);
    };

    let file_name = log_file
        .file_name()
        .with_context(|| format!("Not a file path: {}", log_file.display()))?;
    let dir = match log_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(stderr)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()
        .context("Failed to initialize tracing")?;

    Ok(Some(guard))
}
