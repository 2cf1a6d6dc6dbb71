//! In-memory record store for tasks and boards.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{Board, BoardId, Placement, Position, Task, TaskId},
    ports::{BoardRepository, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task and board store.
///
/// Both repository ports share one lock, so [`TaskRepository::apply_placements`]
/// and [`TaskRepository::delete`] are atomic with respect to every other call.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    boards: HashMap<BoardId, Board>,
    tasks: HashMap<TaskId, Task>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

impl InMemoryTaskState {
    fn board_tasks(&self, board_id: BoardId) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .values()
            .filter(|task| task.board_id() == board_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|task| (task.position(), task.id()));
        tasks
    }

    /// Applies `placements` to `staged`, recording every board they touch.
    fn stage_placements(
        &self,
        staged: &mut HashMap<TaskId, Task>,
        touched_boards: &mut HashSet<BoardId>,
        placements: &[Placement],
    ) -> TaskRepositoryResult<()> {
        for placement in placements {
            if !self.boards.contains_key(&placement.board_id) {
                return Err(TaskRepositoryError::BoardNotFound(placement.board_id));
            }
            let task = staged
                .get_mut(&placement.task_id)
                .ok_or(TaskRepositoryError::NotFound(placement.task_id))?;
            touched_boards.insert(task.board_id());
            touched_boards.insert(placement.board_id);
            task.place(placement.board_id, placement.position);
        }
        Ok(())
    }

    fn slot_taken(&self, board_id: BoardId, position: Position) -> bool {
        self.tasks
            .values()
            .any(|task| task.board_id() == board_id && task.position() == position)
    }
}

/// Checks the unique `(board, position)` constraint over the touched boards.
fn check_unique_slots(
    tasks: &HashMap<TaskId, Task>,
    boards: &HashSet<BoardId>,
) -> TaskRepositoryResult<()> {
    let mut seen = HashSet::new();
    for task in tasks.values().filter(|task| boards.contains(&task.board_id())) {
        if !seen.insert((task.board_id(), task.position())) {
            return Err(TaskRepositoryError::DuplicatePosition {
                board_id: task.board_id(),
                position: task.position(),
            });
        }
    }
    Ok(())
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        if !state.boards.contains_key(&task.board_id()) {
            return Err(TaskRepositoryError::BoardNotFound(task.board_id()));
        }
        if state.slot_taken(task.board_id(), task.position()) {
            return Err(TaskRepositoryError::DuplicatePosition {
                board_id: task.board_id(),
                position: task.position(),
            });
        }

        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .tasks
            .get_mut(&task.id())
            .ok_or(TaskRepositoryError::NotFound(task.id()))?;

        // Placement columns are owned by `apply_placements`.
        let mut updated = task.clone();
        updated.place(stored.board_id(), stored.position());
        *stored = updated;
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn list_by_board(&self, board_id: BoardId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state.board_tasks(board_id))
    }

    async fn count_by_board(&self, board_id: BoardId) -> TaskRepositoryResult<u32> {
        let state = self.read()?;
        let count = state
            .tasks
            .values()
            .filter(|task| task.board_id() == board_id)
            .count();
        u32::try_from(count).map_err(TaskRepositoryError::persistence)
    }

    async fn delete(&self, id: TaskId, placements: &[Placement]) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;

        let mut staged = state.tasks.clone();
        let removed = staged.remove(&id).ok_or(TaskRepositoryError::NotFound(id))?;
        let mut touched_boards = HashSet::from([removed.board_id()]);
        state.stage_placements(&mut staged, &mut touched_boards, placements)?;
        check_unique_slots(&staged, &touched_boards)?;

        state.tasks = staged;
        Ok(())
    }

    async fn apply_placements(&self, placements: &[Placement]) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;

        // Stage on a copy so a rejected batch leaves the live map untouched.
        let mut staged = state.tasks.clone();
        let mut touched_boards = HashSet::new();
        state.stage_placements(&mut staged, &mut touched_boards, placements)?;
        check_unique_slots(&staged, &touched_boards)?;

        state.tasks = staged;
        Ok(())
    }
}

#[async_trait]
impl BoardRepository for InMemoryTaskRepository {
    async fn store_board(&self, board: &Board) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.boards.contains_key(&board.id()) {
            return Err(TaskRepositoryError::DuplicateBoard(board.id()));
        }
        state.boards.insert(board.id(), *board);
        Ok(())
    }

    async fn find_board(&self, id: BoardId) -> TaskRepositoryResult<Option<Board>> {
        let state = self.read()?;
        Ok(state.boards.get(&id).copied())
    }
}
