//! Tetris Bot Protocol (TBP) plumbing.
//!
//! The engine is a child process speaking newline-delimited JSON over its
//! stdio:
//! - `codec`: newline framing that skips, rather than fails on, overlong
//!   lines.
//! - `messages`: outbound message enum and structural checks on replies.
//! - `spawner`: executable precondition, process launch and bounded exit wait.
//! - `driver`: the scripted handshake → suggest → play exchange.

pub mod codec;
pub mod driver;
pub mod messages;
pub mod spawner;
