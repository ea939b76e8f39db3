//! One complete probe run: spawn the engine, play the script, tear down.

use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::ProbeConfig;
use crate::tbp::driver::{Driver, ProbeReport};
use crate::tbp::spawner::{self, BotConnection};
use crate::Result;

/// Run the scripted exchange against the engine described by `config`.
///
/// Teardown (close the engine's stdin, then wait for it to exit within
/// `config.exit_timeout`) runs exactly once on every path past the spawn,
/// whether the script finished, stopped early on a pipe error, or skipped
/// `stop` / `quit`. A failed exit wait takes precedence over a script error.
///
/// # Errors
///
/// - `AppError::BotNotFound` — no executable at `config.bot_path`; checked
///   first, nothing is spawned.
/// - `AppError::Config` — `config` failed validation.
/// - `AppError::Spawn` — the engine could not be launched.
/// - `AppError::Io` / `AppError::Protocol` — the exchange broke off.
/// - `AppError::ExitTimeout` — the engine outlived the exit bound.
pub async fn run_probe(config: &ProbeConfig) -> Result<ProbeReport> {
    spawner::ensure_bot_exists(&config.bot_path)?;
    config.validate()?;

    let session_id = Uuid::new_v4().to_string();
    let span = info_span!("probe", %session_id, bot = %config.bot_path.display());

    drive(config).instrument(span).await
}

async fn drive(config: &ProbeConfig) -> Result<ProbeReport> {
    let BotConnection {
        process,
        stdin,
        stdout,
    } = spawner::spawn_bot(&config.bot_path)?;

    let mut driver = Driver::with_max_line_bytes(stdout, stdin, config.max_line_bytes);
    let outcome = driver.run(&config.script()).await;
    if let Err(err) = &outcome {
        warn!(%err, "probe sequence aborted");
    }

    let reader = driver.close().await;
    let status = process.wait(config.exit_timeout).await;
    drop(reader);

    let status = status?;
    info!(%status, "bot session closed");
    outcome
}
