#![forbid(unsafe_code)]

//! `tbp-probe` — drive a Tetris Bot Protocol engine through one
//! handshake → suggest → play exchange and print the wire transcript.

pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod probe;
pub mod tbp;

pub use config::ProbeConfig;
pub use errors::{AppError, Result};
