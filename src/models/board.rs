//! Playfield grid sent in the `start` message.

use serde::Serialize;

/// Default number of board rows, including the hidden buffer above the
/// visible field.
pub const DEFAULT_ROWS: usize = 40;

/// Default number of board columns.
pub const DEFAULT_COLS: usize = 10;

/// A fixed-size `rows × cols` grid of cells.
///
/// Each cell is either empty (`None`, serialised as `null`) or a piece-color
/// marker such as `'I'` or `'G'`. The probe only ever builds empty boards;
/// the engine tracks the field itself once the game has started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Board {
    cells: Vec<Vec<Option<char>>>,
}

impl Board {
    /// Build a fully empty board with the given dimensions.
    #[must_use]
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            cells: vec![vec![None; cols]; rows],
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    /// Number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    /// Total number of cells (`rows × cols`).
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    /// Whether every cell is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(Option::is_none)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty(DEFAULT_ROWS, DEFAULT_COLS)
    }
}
