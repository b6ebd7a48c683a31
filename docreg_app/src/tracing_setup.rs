use std::io;
use std::path::Path;

use anyhow::Context;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Where log lines go besides the rolling file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Hourly rolling file only
    File,
    /// Hourly rolling file plus colored stdout
    FileAndStdout,
}

/// Build the filter: `RUST_LOG` when set, `default_level` otherwise
pub fn env_filter(default_level: Level) -> EnvFilter {
    EnvFilter::builder().with_default_directive(default_level.into()).from_env_lossy()
}

/// Install the global subscriber writing through a non-blocking hourly file appender
///
/// The returned guard flushes pending lines on drop; keep it alive for the
/// whole process.
pub fn init(app_name: &str, log_dir: &Path, default_level: Level, output: LogOutput) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir).with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::hourly(log_dir, format!("{app_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer =
        fmt::layer().with_writer(non_blocking).with_target(true).with_thread_ids(true).with_line_number(true).with_ansi(false).compact();

    let stdout_layer = (output == LogOutput::FileAndStdout)
        .then(|| fmt::layer().with_writer(io::stdout).with_target(true).with_thread_ids(true).with_line_number(true).with_ansi(true).compact());

    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(guard)
}
