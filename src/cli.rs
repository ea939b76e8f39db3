//! Command-line surface.
//!
//! Flags mirror the probe's knobs one to one; [`Cli::into_config`] turns the
//! raw values into a [`ProbeConfig`].

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{
    self, ProbeConfig, DEFAULT_EXIT_TIMEOUT_SECS, DEFAULT_QUEUE, DEFAULT_READY_MAX_LINES,
    DEFAULT_READY_TIMEOUT_SECS, DEFAULT_SUGGEST_DELAY_SECS,
};
use crate::models::board::{DEFAULT_COLS, DEFAULT_ROWS};
use crate::models::queue::Queue;
use crate::tbp::codec::MAX_LINE_BYTES;
use crate::tbp::driver::ReadyBound;
use crate::Result;

/// Log output format.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Send minimal TBP messages to a bot for manual testing.
#[derive(Debug, Parser)]
#[command(
    name = "tbp-probe",
    about = "Send minimal TBP messages to a bot for manual testing",
    version,
    long_about = None
)]
pub struct Cli {
    /// Path to the bot executable.
    #[arg(long, default_value_os_t = config::default_bot_path())]
    pub bot_path: PathBuf,

    /// Comma-separated queue to send in start.
    #[arg(long, default_value = DEFAULT_QUEUE)]
    pub queue: String,

    /// Number of board rows to send.
    #[arg(long, default_value_t = DEFAULT_ROWS)]
    pub board_rows: usize,

    /// Number of board columns to send.
    #[arg(long, default_value_t = DEFAULT_COLS)]
    pub board_cols: usize,

    /// Do not send stop/quit at the end (useful if chaining multiple probes).
    #[arg(long)]
    pub no_stop: bool,

    /// Seconds to wait after start before the first suggest (0 or less: no wait).
    #[arg(long, default_value_t = DEFAULT_SUGGEST_DELAY_SECS)]
    pub suggest_delay: f64,

    /// Seconds to wait for the bot's ready reply before carrying on.
    #[arg(long, default_value_t = DEFAULT_READY_TIMEOUT_SECS)]
    pub ready_timeout: f64,

    /// Lines to read while waiting for ready before carrying on.
    #[arg(long, default_value_t = DEFAULT_READY_MAX_LINES)]
    pub ready_max_lines: usize,

    /// Seconds to wait for the bot to exit once its stdin is closed.
    #[arg(long, default_value_t = DEFAULT_EXIT_TIMEOUT_SECS)]
    pub exit_timeout: f64,

    /// Skip bot output lines longer than this many bytes.
    #[arg(long, default_value_t = MAX_LINE_BYTES)]
    pub max_line_bytes: usize,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Convert parsed flags into a [`ProbeConfig`].
    ///
    /// Bounds are checked later by [`ProbeConfig::validate`], after the bot
    /// path has been checked.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for an empty queue or a negative or NaN
    /// timeout.
    pub fn into_config(self) -> Result<ProbeConfig> {
        Ok(ProbeConfig {
            queue: Queue::parse(&self.queue)?,
            bot_path: self.bot_path,
            board_rows: self.board_rows,
            board_cols: self.board_cols,
            send_stop: !self.no_stop,
            suggest_delay: config::pause("--suggest-delay", self.suggest_delay)?,
            ready: ReadyBound {
                max_lines: self.ready_max_lines,
                timeout: config::seconds("--ready-timeout", self.ready_timeout)?,
            },
            exit_timeout: config::seconds("--exit-timeout", self.exit_timeout)?,
            max_line_bytes: self.max_line_bytes,
        })
    }
}
