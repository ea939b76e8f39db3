//! Error types shared across the probe.

use std::fmt::{Display, Formatter};

/// Shared probe result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Probe error enumeration covering every failure mode of a run.
#[derive(Debug)]
pub enum AppError {
    /// Command-line value failed validation.
    Config(String),
    /// Engine executable does not exist at the configured path.
    BotNotFound(String),
    /// The OS refused to launch the engine or its pipes were unavailable.
    Spawn(String),
    /// Line framing or message serialisation failure on the bot pipe.
    Protocol(String),
    /// Read or write failure on the bot pipe.
    Io(String),
    /// Engine did not exit within the bounded teardown wait.
    ExitTimeout(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::BotNotFound(msg) => write!(f, "bot not found: {msg}"),
            Self::Spawn(msg) => write!(f, "spawn: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
            Self::ExitTimeout(msg) => write!(f, "exit timeout: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(format!("json serialisation failed: {err}"))
    }
}
