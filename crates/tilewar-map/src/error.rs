//! Error types for the map layer.

use crate::Coord;

/// Errors raised while building or editing a grid.
///
/// Rule violations found by the validator are not errors: they are
/// collected into a [`ValidationReport`](crate::ValidationReport).
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// A row's length differs from the first row's.
    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A coordinate fell outside the grid.
    #[error("coordinate {0} is outside the grid")]
    OutOfBounds(Coord),
}
