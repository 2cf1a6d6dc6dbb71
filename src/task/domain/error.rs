//! Error types for task domain validation.

use super::{Position, TaskId};
use thiserror::Error;

/// Errors returned while constructing or planning domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The start date falls after the end date.
    #[error("task start date must not be after its end date")]
    InvertedDateRange,

    /// A requested position lies outside the destination board.
    #[error("position {requested} is out of range, expected at most {max}")]
    InvalidPosition {
        /// The requested position.
        requested: Position,
        /// The largest position the destination board accepts.
        max: Position,
    },

    /// The task is not part of the ordering it was looked up in.
    #[error("task {0} is not on the board being reordered")]
    TaskNotOnBoard(TaskId),

    /// A bulk reorder names the same task more than once.
    #[error("task {0} appears more than once in the reorder batch")]
    DuplicatePlacement(TaskId),

    /// The attachment file name cannot be used as a single path segment.
    #[error("invalid attachment name '{0}'")]
    InvalidAttachmentName(String),
}
