//! Engine process spawner.
//!
//! Launches the bot with:
//! - stdin and stdout piped for the TBP exchange, stderr inherited so the
//!   engine's own diagnostics reach the terminal;
//! - `kill_on_drop(true)` so a panicking or aborted probe never leaves the
//!   engine running.
//!
//! Teardown is two steps owned by the caller: close the engine's stdin (see
//! [`Driver::close`](crate::tbp::driver::Driver::close)), then
//! [`BotProcess::wait`] with a bound.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::{AppError, Result};

/// Check that the engine executable exists.
///
/// # Errors
///
/// Returns `AppError::BotNotFound` carrying the path if nothing exists there.
pub fn ensure_bot_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(AppError::BotNotFound(path.display().to_string()))
    }
}

/// A running engine process.
#[derive(Debug)]
pub struct BotProcess {
    child: Child,
}

/// A freshly spawned engine and its stdio pipes.
#[derive(Debug)]
pub struct BotConnection {
    /// Process handle; the engine is killed if this is dropped while running.
    pub process: BotProcess,
    /// Engine's stdin, for outbound messages.
    pub stdin: ChildStdin,
    /// Engine's stdout, for inbound messages.
    pub stdout: ChildStdout,
}

/// Launch the engine at `path`.
///
/// # Errors
///
/// - `AppError::BotNotFound` — `path` does not exist; nothing is spawned.
/// - `AppError::Spawn` — the OS refused to start the process or its pipes
///   could not be captured.
pub fn spawn_bot(path: &Path) -> Result<BotConnection> {
    ensure_bot_exists(path)?;

    let mut child = Command::new(command_path(path))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| AppError::Spawn(format!("failed to spawn {}: {err}", path.display())))?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| AppError::Spawn("failed to capture bot stdin".into()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::Spawn("failed to capture bot stdout".into()))?;

    info!(pid = ?child.id(), path = %path.display(), "bot spawned");

    Ok(BotConnection {
        process: BotProcess { child },
        stdin,
        stdout,
    })
}

impl BotProcess {
    /// Wait up to `timeout` for the engine to exit.
    ///
    /// Close the engine's stdin first; most engines exit on end-of-input.
    ///
    /// # Errors
    ///
    /// - `AppError::ExitTimeout` — still running after `timeout`; the process
    ///   is killed before returning.
    /// - `AppError::Io` — the OS wait failed.
    pub async fn wait(mut self, timeout: Duration) -> Result<ExitStatus> {
        match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(Ok(status)) => {
                debug!(%status, "bot exited");
                Ok(status)
            }
            Ok(Err(err)) => Err(AppError::Io(format!("failed to wait for bot: {err}"))),
            Err(_elapsed) => {
                warn!(?timeout, "bot did not exit in time, killing");
                self.child.kill().await.ok();
                Err(AppError::ExitTimeout(format!(
                    "bot still running after {timeout:?}"
                )))
            }
        }
    }
}

/// Path handed to [`Command::new`].
///
/// A bare file name such as `bot` is looked up on `PATH` by the OS; the
/// probe means the file in the working directory.
fn command_path(path: &Path) -> PathBuf {
    if path.is_relative() && path.components().count() == 1 {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}
