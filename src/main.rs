//! subextract - Embedded Subtitle Extraction
//!
//! Entry point: parses flags, sets up logging and configuration, then runs
//! either the batch driver or the interactive session.

use std::io;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use subextract::batch::{BatchDriver, BatchReport};
use subextract::cli::{Args, RunMode};
use subextract::config::{Config, DEFAULT_CONFIG_FILE};
use subextract::media::SystemRunner;
use subextract::picker;
use subextract::session::Session;
use subextract::streams::StreamListing;
use subextract::validate::ValidatedInput;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }

    let mut config = load_config(&args)?;
    args.apply_overrides(&mut config);

    let _log_guard = setup_logging(args.verbose, config.logging.directory.as_deref())?;
    info!("Starting subextract");

    let runner = SystemRunner;
    match args.run_mode() {
        RunMode::Interactive => {
            run_session(&runner, config, None).await?;
        }
        RunMode::Batch(_) => {
            let request = args
                .batch_request()
                .ok_or_else(|| anyhow::anyhow!("an input file is required"))?;

            let report = BatchDriver::new(&runner, &config, io::stdout())
                .run(&request)
                .await?;

            if let BatchReport::HandOff { input, listing } = report {
                run_session(&runner, config, Some((input, listing))).await?;
            }
        }
    }

    info!("subextract finished");
    Ok(())
}

async fn run_session(
    runner: &SystemRunner,
    config: Config,
    loaded: Option<(ValidatedInput, StreamListing)>,
) -> Result<()> {
    let working_dir = std::env::current_dir()?;
    let stdin = io::stdin();
    let mut session =
        Session::new(runner, config, stdin.lock(), io::stdout()).with_working_dir(working_dir);
    if let Some(picker) = picker::default_picker() {
        session = session.with_picker(picker);
    }

    match loaded {
        Some((input, listing)) => session.run_with_file(input, listing).await?,
        None => session.run().await?,
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };
    Ok(config)
}

/// Console logging on stderr, plus a daily rolling file when a log directory is set
fn setup_logging(verbose: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Menus share the terminal, so the console only shows warnings by default
    let console_level = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose)
        .with_filter(console_level);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = rolling::daily(dir, "subextract.log");
            let (non_blocking_file, guard) = non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking_file)
                .with_target(false)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false) // No ANSI colors in file
                .with_filter(LevelFilter::DEBUG);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    if let Some(dir) = log_dir {
        info!("Logging to {}", dir.join("subextract.log").display());
    }
    Ok(guard)
}
