//! Vigil - Main Entry Point
//! Loads providers and configuration, then runs checks until stopped

mod app;
mod logging;
mod signals;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use logging::{init_logging, LogFormat};
use vigil_core::domain::CheckArgs;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_CONFIG: &str = "config.yaml";
const DEFAULT_PROVIDERS_DIR: &str = "./providers";
const DEFAULT_TICK_MS: u64 = 1000;

#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(about = "Periodic health-monitoring engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Monitored targets (YAML)
    #[arg(long, global = true, env = "VIGIL_CONFIG", default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Directory of provider manifests; the built-in provider is used when absent
    #[arg(long, global = true, env = "VIGIL_PROVIDERS_DIR", default_value = DEFAULT_PROVIDERS_DIR)]
    providers_dir: PathBuf,

    /// Console log format
    #[arg(long, global = true, env = "VIGIL_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Also write JSON logs to a daily file in this directory
    #[arg(long, global = true, env = "VIGIL_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Scheduler tick period in milliseconds
    #[arg(long, global = true, env = "VIGIL_TICK_MS", default_value_t = DEFAULT_TICK_MS)]
    tick_ms: u64,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Run the scheduler until interrupted (default)
    Run,

    /// Load providers and config, validate every check, then exit
    Validate,

    /// Run one check once and print the result as JSON
    Probe {
        /// Check key (e.g. http, ssl, dns)
        check: String,

        /// Target domain or URL
        target: String,

        /// Check argument, repeatable
        #[arg(long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        args: Vec<(String, String)>,
    },
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))?;
    if key.is_empty() {
        return Err(format!("empty key in {raw:?}"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so the file writer flushes on exit
    let _log_guard = init_logging(cli.log_format, cli.log_dir.as_deref())?;

    let result = dispatch(cli).await;
    if let Err(e) = &result {
        let chain = format!("{e:#}");
        error!(error = %chain, "Vigil stopped with an error");
    }
    result
}

async fn dispatch(cli: Cli) -> Result<()> {
    let source = app::provider_source(&cli.providers_dir);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            info!("Vigil v{} starting...", VERSION);
            let targets = app::load_targets(&cli.config)?;
            let tick_period = Duration::from_millis(cli.tick_ms);
            app::run(source.as_ref(), &targets, tick_period).await
        }

        Commands::Validate => {
            let jobs = app::validate(source.as_ref(), &cli.config)?;
            println!("Config OK: {jobs} jobs");
            Ok(())
        }

        Commands::Probe {
            check,
            target,
            args,
        } => {
            let args: CheckArgs = args.into_iter().collect();
            let result = app::probe(source.as_ref(), &check, &target, args).await?;
            let json =
                serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
            println!("{json}");
            Ok(())
        }
    }
}
