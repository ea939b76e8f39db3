#![forbid(unsafe_code)]

//! `tbp-probe` — launch a TBP bot, walk it through one suggest/play
//! exchange, and log every line on the wire.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use tbp_probe::cli::{Cli, LogFormat};
use tbp_probe::probe::run_probe;
use tbp_probe::tbp::spawner::ensure_bot_exists;
use tbp_probe::{AppError, Result};

fn main() -> ExitCode {
    let args = Cli::parse();
    if let Err(err) = init_tracing(args.log_format) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "probe failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Cli) -> Result<()> {
    ensure_bot_exists(&args.bot_path)?;
    let config = args.into_config()?;

    // One request in flight at a time; a single-threaded runtime is enough.
    let report = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run_probe(&config))?;

    info!(
        ready = ?report.ready,
        retried = report.retried,
        played = ?report.played,
        stopped = report.stopped,
        "probe finished"
    );
    Ok(())
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
