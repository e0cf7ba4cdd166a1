//! Logging setup
//!
//! Console output goes to stderr so `vigil probe` can print JSON on stdout.

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "vigil=info";
const LOG_FILE_PREFIX: &str = "vigil.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable, with colors
    Pretty,
    /// One JSON object per event
    Json,
}

/// Install the global subscriber
///
/// `RUST_LOG` overrides the default `vigil=info` filter. With `log_dir` set,
/// events are also written as JSON to a daily-rolling file; keep the returned
/// guard alive until exit so buffered lines are flushed.
pub fn init_logging(format: LogFormat, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Failed to create env filter")?;

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log dir {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let base = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    match format {
        LogFormat::Json => base
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => base
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    }
    .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
