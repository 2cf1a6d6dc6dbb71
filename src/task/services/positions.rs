//! Position management for board-scoped task ordering.
//!
//! Every write takes the per-board lock of each board it touches and goes
//! through one [`TaskRepository::apply_placements`] call, so a board's
//! ordering changes atomically and concurrent writers to the same board are
//! serialised.

use crate::task::{
    domain::{
        BoardId, BoardOrdering, MovePlan, Placement, Position, Task, TaskDomainError, TaskId,
        plan_move,
    },
    failure::FailureKind,
    locks::{KeyedGuard, KeyedLocks},
    ports::{BoardRepository, TaskRepository, TaskRepositoryError},
};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Request payload for moving a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTaskRequest {
    task_id: TaskId,
    position: Position,
    board_id: Option<BoardId>,
}

impl MoveTaskRequest {
    /// Creates a request moving a task within its current board.
    #[must_use]
    pub const fn new(task_id: TaskId, position: Position) -> Self {
        Self {
            task_id,
            position,
            board_id: None,
        }
    }

    /// Targets another board.
    #[must_use]
    pub const fn to_board(mut self, board_id: BoardId) -> Self {
        self.board_id = Some(board_id);
        self
    }
}

/// Service-level errors for position operations.
#[derive(Debug, Error)]
pub enum PositionServiceError {
    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// The referenced board does not exist.
    #[error("board not found: {0}")]
    BoardNotFound(BoardId),
    /// Planning rejected the request.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// The record store failed; nothing was written.
    #[error(transparent)]
    Repository(TaskRepositoryError),
}

impl From<TaskRepositoryError> for PositionServiceError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::NotFound(task_id) => Self::TaskNotFound(task_id),
            TaskRepositoryError::BoardNotFound(board_id) => Self::BoardNotFound(board_id),
            other => Self::Repository(other),
        }
    }
}

impl PositionServiceError {
    /// Returns the failure kind of this error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::TaskNotFound(_) | Self::BoardNotFound(_) => FailureKind::NotFound,
            Self::Domain(_) => FailureKind::InvalidInput,
            Self::Repository(err) => err.kind(),
        }
    }
}

/// Result type for position operations.
pub type PositionServiceResult<T> = Result<T, PositionServiceError>;

/// Maintains the dense `0..N` ordering of every board's tasks.
pub struct PositionService<R>
where
    R: TaskRepository + BoardRepository,
{
    repository: Arc<R>,
    board_locks: Arc<KeyedLocks<BoardId>>,
}

impl<R> Clone for PositionService<R>
where
    R: TaskRepository + BoardRepository,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            board_locks: Arc::clone(&self.board_locks),
        }
    }
}

impl<R> PositionService<R>
where
    R: TaskRepository + BoardRepository,
{
    /// Creates a new position service.
    #[must_use]
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            board_locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Waits for exclusive write access to a board.
    ///
    /// Callers writing tasks outside this service (creates, deletes) hold the
    /// guard across their read-then-write sequence.
    pub async fn lock_board(&self, board_id: BoardId) -> KeyedGuard {
        self.board_locks.acquire(&board_id).await
    }

    /// Returns the position a task appended to `board_id` receives.
    ///
    /// The result is only stable while the caller holds
    /// [`PositionService::lock_board`] for the board.
    ///
    /// # Errors
    ///
    /// Returns [`PositionServiceError::BoardNotFound`] when the board does not
    /// exist, or a repository error when the count fails.
    pub async fn append_position(&self, board_id: BoardId) -> PositionServiceResult<Position> {
        self.ensure_board(board_id).await?;
        let count = self.repository.count_by_board(board_id).await?;
        Ok(Position::new(count))
    }

    /// Moves a task to `position`, optionally onto another board.
    ///
    /// Returns the task as stored after the move. Moving a task onto its
    /// current slot writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`PositionServiceError::TaskNotFound`] or
    /// [`PositionServiceError::BoardNotFound`] for unknown references,
    /// [`PositionServiceError::Domain`] when the position is out of range, or
    /// a repository error when the transaction fails.
    pub async fn move_task(&self, request: MoveTaskRequest) -> PositionServiceResult<Task> {
        if let Some(board_id) = request.board_id {
            self.ensure_board(board_id).await?;
        }

        let (task, _guards) = self
            .lock_task_boards(request.task_id, request.board_id)
            .await?;
        let source_id = task.board_id();
        let source = self.snapshot(source_id).await?;
        let destination = match request.board_id {
            Some(board_id) if board_id != source_id => Some(self.snapshot(board_id).await?),
            _ => None,
        };

        let plan = plan_move(&source, destination.as_ref(), task.id(), request.position)?;
        if plan.is_noop() {
            return Ok(task);
        }
        self.repository.apply_placements(plan.placements()).await?;
        debug!(
            task_id = %task.id(),
            from_board = %source_id,
            to_board = %request.board_id.unwrap_or(source_id),
            position = %request.position,
            writes = plan.placements().len(),
            "positions: moved task"
        );

        self.repository
            .find_by_id(task.id())
            .await?
            .ok_or(PositionServiceError::TaskNotFound(task.id()))
    }

    /// Writes a caller-computed final state for many tasks at once.
    ///
    /// The placements are applied verbatim in one transaction while every
    /// destination board and every board currently holding a placed task is
    /// locked. The caller is trusted to have computed a dense ordering for
    /// every board involved; this method checks references, not density.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DuplicatePlacement`] when a task is listed
    /// twice, [`PositionServiceError::TaskNotFound`] or
    /// [`PositionServiceError::BoardNotFound`] for unknown references, or a
    /// repository error when the transaction fails. Nothing is written on
    /// error.
    pub async fn reorder(&self, placements: &[Placement]) -> PositionServiceResult<()> {
        if placements.is_empty() {
            return Ok(());
        }

        let mut seen = HashSet::with_capacity(placements.len());
        if let Some(duplicate) = placements.iter().find(|p| !seen.insert(p.task_id)) {
            return Err(TaskDomainError::DuplicatePlacement(duplicate.task_id).into());
        }

        let destinations: HashSet<BoardId> = placements.iter().map(|p| p.board_id).collect();
        for board_id in &destinations {
            self.ensure_board(*board_id).await?;
        }

        let mut sources = self.current_boards(placements).await?;
        loop {
            let guards = self
                .board_locks
                .acquire_all(destinations.iter().chain(&sources).copied())
                .await;
            let observed = self.current_boards(placements).await?;
            if observed == sources {
                self.repository.apply_placements(placements).await?;
                debug!(
                    writes = placements.len(),
                    boards = guards.len(),
                    "positions: applied bulk reorder"
                );
                return Ok(());
            }
            drop(guards);
            sources = observed;
        }
    }

    /// Renumbers a board's tasks to `0..N`, keeping their current order.
    ///
    /// Returns how many tasks were rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`PositionServiceError::BoardNotFound`] when the board does not
    /// exist, or a repository error when the transaction fails.
    pub async fn compact_board(&self, board_id: BoardId) -> PositionServiceResult<usize> {
        self.ensure_board(board_id).await?;
        let _guard = self.lock_board(board_id).await;
        self.compact_locked(board_id).await
    }

    /// Renumbers a board while the caller already holds its lock.
    async fn compact_locked(&self, board_id: BoardId) -> PositionServiceResult<usize> {
        let plan = self.snapshot(board_id).await?.compaction();
        if plan.is_noop() {
            return Ok(0);
        }
        self.repository.apply_placements(plan.placements()).await?;
        debug!(board_id = %board_id, writes = plan.placements().len(), "positions: compacted board");
        Ok(plan.placements().len())
    }

    /// Plans the renumbering that closes the gap `task_id` leaves on
    /// `board_id` once deleted.
    ///
    /// The plan is only valid while the caller holds the board's lock.
    pub(crate) async fn removal_plan(
        &self,
        board_id: BoardId,
        task_id: TaskId,
    ) -> PositionServiceResult<MovePlan> {
        Ok(self.snapshot(board_id).await?.without(task_id).compaction())
    }

    /// Locks the task's current board (and `extra`, if any) and returns the
    /// task as read under those locks.
    ///
    /// Retries when the task changed boards while the locks were awaited.
    pub(crate) async fn lock_task_boards(
        &self,
        task_id: TaskId,
        extra: Option<BoardId>,
    ) -> PositionServiceResult<(Task, Vec<KeyedGuard>)> {
        let mut expected_board = self.find_task(task_id).await?.board_id();
        loop {
            let guards = self
                .board_locks
                .acquire_all([Some(expected_board), extra].into_iter().flatten())
                .await;
            let task = self.find_task(task_id).await?;
            if task.board_id() == expected_board {
                return Ok((task, guards));
            }
            drop(guards);
            expected_board = task.board_id();
        }
    }

    /// Returns the boards currently holding each placed task, in placement
    /// order.
    async fn current_boards(&self, placements: &[Placement]) -> PositionServiceResult<Vec<BoardId>> {
        let mut boards = Vec::with_capacity(placements.len());
        for placement in placements {
            boards.push(self.find_task(placement.task_id).await?.board_id());
        }
        Ok(boards)
    }

    async fn snapshot(&self, board_id: BoardId) -> PositionServiceResult<BoardOrdering> {
        let tasks = self.repository.list_by_board(board_id).await?;
        Ok(BoardOrdering::from_tasks(board_id, &tasks))
    }

    async fn find_task(&self, task_id: TaskId) -> PositionServiceResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(PositionServiceError::TaskNotFound(task_id))
    }

    async fn ensure_board(&self, board_id: BoardId) -> PositionServiceResult<()> {
        self.repository
            .find_board(board_id)
            .await?
            .map(|_| ())
            .ok_or(PositionServiceError::BoardNotFound(board_id))
    }
}
