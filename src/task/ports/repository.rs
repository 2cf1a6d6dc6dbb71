//! Record store ports for task and board persistence.

use crate::task::domain::{Board, BoardId, Placement, Position, Task, TaskId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for record store operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the identifier
    /// already exists, [`TaskRepositoryError::DuplicatePosition`] when the
    /// board slot is taken, or [`TaskRepositoryError::BoardNotFound`] when
    /// the board does not exist.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Persists changes to an existing task's owner, details and completion
    /// state. Board and position are only written by
    /// [`TaskRepository::apply_placements`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns a board's tasks sorted by position ascending, ties broken by
    /// identifier.
    async fn list_by_board(&self, board_id: BoardId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the number of tasks on a board.
    async fn count_by_board(&self, board_id: BoardId) -> TaskRepositoryResult<u32>;

    /// Deletes a task and writes `placements` in the same transaction.
    ///
    /// `placements` carries the renumbering that closes the gap the task
    /// leaves; pass an empty slice to delete without touching other rows.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist,
    /// or any error [`TaskRepository::apply_placements`] reports for the
    /// placements. Nothing is deleted or written on error.
    async fn delete(&self, id: TaskId, placements: &[Placement]) -> TaskRepositoryResult<()>;

    /// Writes every placement in one transaction.
    ///
    /// Either all `(board, position)` pairs are written or none are.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] for the first missing task,
    /// [`TaskRepositoryError::BoardNotFound`] when a destination board is
    /// missing, or [`TaskRepositoryError::DuplicatePosition`] /
    /// [`TaskRepositoryError::Conflict`] when the final state still holds two
    /// tasks in one slot. Nothing is written on error.
    async fn apply_placements(&self, placements: &[Placement]) -> TaskRepositoryResult<()>;
}

/// Board persistence contract.
#[async_trait]
pub trait BoardRepository: Send + Sync {
    /// Stores a new board.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateBoard`] when the identifier
    /// already exists.
    async fn store_board(&self, board: &Board) -> TaskRepositoryResult<()>;

    /// Finds a board by identifier.
    ///
    /// Returns `None` when the board does not exist.
    async fn find_board(&self, id: BoardId) -> TaskRepositoryResult<Option<Board>>;
}

/// Errors returned by record store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// Another task already occupies the board slot.
    #[error("position {position} on board {board_id} is already taken")]
    DuplicatePosition {
        /// Board holding the conflicting slot.
        board_id: BoardId,
        /// Conflicting position.
        position: Position,
    },

    /// A board with the same identifier already exists.
    #[error("duplicate board identifier: {0}")]
    DuplicateBoard(BoardId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The referenced board was not found.
    #[error("board not found: {0}")]
    BoardNotFound(BoardId),

    /// The store rejected a write on a uniqueness or reference constraint
    /// whose offending row it could not identify.
    #[error("constraint violated: {0}")]
    Conflict(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
