//! Run configuration assembled from the command line and validated.

use std::path::PathBuf;
use std::time::Duration;

use crate::models::board::{DEFAULT_COLS, DEFAULT_ROWS};
use crate::models::queue::Queue;
use crate::tbp::codec::MAX_LINE_BYTES;
use crate::tbp::driver::{ReadyBound, Script};
use crate::{AppError, Result};

/// Default delay between `start` and the first `suggest`, in seconds.
pub const DEFAULT_SUGGEST_DELAY_SECS: f64 = 0.025;

/// Default wall-clock window for the ready drain, in seconds.
pub const DEFAULT_READY_TIMEOUT_SECS: f64 = 5.0;

/// Default maximum number of lines read while waiting for `ready`.
pub const DEFAULT_READY_MAX_LINES: usize = 256;

/// Default bound on the final process-exit wait, in seconds.
pub const DEFAULT_EXIT_TIMEOUT_SECS: f64 = 5.0;

/// Default queue sent in `start`.
pub const DEFAULT_QUEUE: &str = "I,O,T";

/// Default engine location: a release build of Cold Clear 2 next to the
/// working directory.
#[must_use]
pub fn default_bot_path() -> PathBuf {
    let exe = format!("cold-clear-2{}", std::env::consts::EXE_SUFFIX);
    ["cold-clear-2", "target", "release", exe.as_str()]
        .iter()
        .collect()
}

/// Settings for a single probe run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    /// Engine executable location.
    pub bot_path: PathBuf,
    /// Pieces sent in `start`.
    pub queue: Queue,
    /// Board rows sent in `start`.
    pub board_rows: usize,
    /// Board columns sent in `start`.
    pub board_cols: usize,
    /// Send `stop` and `quit` at the end of the run.
    pub send_stop: bool,
    /// Pause between `start` and the first `suggest`.
    pub suggest_delay: Duration,
    /// Bounds on the drain that waits for `ready`.
    pub ready: ReadyBound,
    /// Bound on the final wait for the engine to exit.
    pub exit_timeout: Duration,
    /// Inbound lines longer than this many bytes are skipped.
    pub max_line_bytes: usize,
}

impl ProbeConfig {
    /// Configuration with every default except the engine path and queue.
    #[must_use]
    pub fn new(bot_path: PathBuf, queue: Queue) -> Self {
        Self {
            bot_path,
            queue,
            board_rows: DEFAULT_ROWS,
            board_cols: DEFAULT_COLS,
            send_stop: true,
            suggest_delay: Duration::from_secs_f64(DEFAULT_SUGGEST_DELAY_SECS),
            ready: ReadyBound::default(),
            exit_timeout: Duration::from_secs_f64(DEFAULT_EXIT_TIMEOUT_SECS),
            max_line_bytes: MAX_LINE_BYTES,
        }
    }

    /// Check the probe's own bounds.
    ///
    /// Any board size is accepted, including zero rows or columns.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the ready drain allows zero lines or the
    /// inbound line cap is zero.
    pub fn validate(&self) -> Result<()> {
        if self.ready.max_lines == 0 {
            return Err(AppError::Config(
                "ready_max_lines must be greater than zero".into(),
            ));
        }

        if self.max_line_bytes == 0 {
            return Err(AppError::Config(
                "max_line_bytes must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    /// The message script the driver plays for this configuration.
    #[must_use]
    pub fn script(&self) -> Script {
        Script::new(self.queue.clone(), self.board_rows, self.board_cols)
            .with_suggest_delay(self.suggest_delay)
            .with_ready_bound(self.ready)
            .with_stop(self.send_stop)
    }
}

/// Convert a command-line seconds value into a [`Duration`].
///
/// # Errors
///
/// Returns `AppError::Config` naming `flag` if `secs` is negative, NaN, or
/// too large to represent.
pub fn seconds(flag: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|err| {
        AppError::Config(format!(
            "{flag} must be a non-negative number of seconds: {err}"
        ))
    })
}

/// Convert a command-line pause into a [`Duration`].
///
/// Zero, negative, and NaN values mean no pause.
///
/// # Errors
///
/// Returns `AppError::Config` naming `flag` if `secs` is positive but too
/// large to represent.
pub fn pause(flag: &str, secs: f64) -> Result<Duration> {
    if secs.is_nan() || secs <= 0.0 {
        return Ok(Duration::ZERO);
    }
    seconds(flag, secs)
}
