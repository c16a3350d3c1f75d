//! Error types for board construction and command parsing.

use thiserror::Error;

/// A board could not be built from the supplied cell values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoardError {
    /// A cell holds something other than 0 or a power of two in `2..=MAX_TILE`.
    #[error("invalid tile {value} at row {row}, column {col}: expected 0 or a power of two from 2 to 131072")]
    InvalidTile { row: usize, col: usize, value: u32 },
}

/// A line of text did not name a known command or direction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command {input:?}")]
pub struct ParseCommandError {
    pub input: String,
}

impl ParseCommandError {
    pub(crate) fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}
