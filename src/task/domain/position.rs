//! Ordinal positions and the placement triples written by reorders.

use super::{BoardId, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Zero-based rank of a task within its board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(u32);

impl Position {
    /// The first slot on a board.
    pub const FIRST: Self = Self(0);

    /// Creates a position from its numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Converts a list index into a position.
    ///
    /// Returns `None` when the index does not fit the persisted range.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    /// Returns the position as a list index.
    #[must_use]
    pub fn as_index(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl From<u32> for Position {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Desired final `(board, position)` of a single task.
///
/// A bulk reorder is a list of placements describing the final state the
/// caller wants; the store writes them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    /// Task being placed.
    pub task_id: TaskId,
    /// Board the task ends up on.
    pub board_id: BoardId,
    /// Final position on that board.
    pub position: Position,
}

impl Placement {
    /// Creates a placement triple.
    #[must_use]
    pub const fn new(task_id: TaskId, board_id: BoardId, position: Position) -> Self {
        Self {
            task_id,
            board_id,
            position,
        }
    }
}
