//! Upcoming piece queue.

use serde::Serialize;

use crate::{AppError, Result};

/// Ordered, non-empty sequence of upcoming piece identifiers.
///
/// Pieces are stored uppercased (`"I"`, `"O"`, `"T"`, …). The probe does not
/// check that a letter names a real piece shape; the engine is the judge of
/// that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Queue(Vec<String>);

impl Queue {
    /// Build a queue from already-normalised piece letters.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `pieces` is empty.
    pub fn new(pieces: Vec<String>) -> Result<Self> {
        if pieces.is_empty() {
            return Err(AppError::Config("queue must contain at least one piece".into()));
        }
        Ok(Self(pieces))
    }

    /// Parse a comma-separated queue such as `"i, O,t"`.
    ///
    /// Items are trimmed and uppercased; empty items are dropped.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if no piece remains after parsing.
    pub fn parse(raw: &str) -> Result<Self> {
        let pieces = raw
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_uppercase)
            .collect();
        Self::new(pieces).map_err(|_| AppError::Config(format!("queue {raw:?} has no pieces")))
    }

    /// Piece announced in the `new_piece` message after the first placement.
    ///
    /// This is the second queued piece; a single-piece queue repeats its only
    /// piece.
    #[must_use]
    pub fn next_piece(&self) -> &str {
        self.0
            .get(1)
            .or_else(|| self.0.first())
            .map_or("", String::as_str)
    }

    /// All queued pieces in order.
    #[must_use]
    pub fn pieces(&self) -> &[String] {
        &self.0
    }

    /// Number of queued pieces (always at least one).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the queue holds no pieces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
