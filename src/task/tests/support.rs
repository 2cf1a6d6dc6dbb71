//! Shared doubles and builders for task unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{Board, BoardId, PersistedTaskData, Placement, Position, Task, TaskDetails, TaskId},
    ports::{BoardRepository, TaskRepository, TaskRepositoryResult},
};
use async_trait::async_trait;
use chrono::Utc;
use mockall::mock;

mock! {
    pub Store {}

    #[async_trait]
    impl TaskRepository for Store {
        async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;
        async fn update(&self, task: &Task) -> TaskRepositoryResult<()>;
        async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;
        async fn list_by_board(&self, board_id: BoardId) -> TaskRepositoryResult<Vec<Task>>;
        async fn count_by_board(&self, board_id: BoardId) -> TaskRepositoryResult<u32>;
        async fn delete(&self, id: TaskId, placements: &[Placement]) -> TaskRepositoryResult<()>;
        async fn apply_placements(&self, placements: &[Placement]) -> TaskRepositoryResult<()>;
    }

    #[async_trait]
    impl BoardRepository for Store {
        async fn store_board(&self, board: &Board) -> TaskRepositoryResult<()>;
        async fn find_board(&self, id: BoardId) -> TaskRepositoryResult<Option<Board>>;
    }
}

/// Builds a persisted-looking task at `position` on `board_id`.
pub(super) fn task_at(board_id: BoardId, position: u32) -> Task {
    let now = Utc::now();
    Task::from_persisted(PersistedTaskData {
        id: TaskId::new(),
        board_id,
        owner_id: None,
        position: Position::new(position),
        details: TaskDetails::new(format!("task {position}")).expect("valid title"),
        completed_at: None,
        created_at: now,
        updated_at: now,
    })
}

/// In-memory store whose task reads are slowed down and whose placement
/// writes can be redirected to a board that does not exist.
#[derive(Debug, Default)]
pub(super) struct InstrumentedStore {
    inner: InMemoryTaskRepository,
    read_delay: Duration,
    misplace_writes: AtomicBool,
}

impl InstrumentedStore {
    /// Sleeps for `delay` before every task lookup.
    pub(super) fn with_read_delay(delay: Duration) -> Self {
        Self {
            read_delay: delay,
            ..Self::default()
        }
    }

    /// Makes every later placement batch fail inside its transaction.
    pub(super) fn misplace_writes(&self) {
        self.misplace_writes.store(true, Ordering::SeqCst);
    }

    fn placements_for(&self, placements: &[Placement]) -> Vec<Placement> {
        if !self.misplace_writes.load(Ordering::SeqCst) {
            return placements.to_vec();
        }
        let nowhere = BoardId::new();
        placements
            .iter()
            .map(|placement| Placement::new(placement.task_id, nowhere, placement.position))
            .collect()
    }
}

#[async_trait]
impl TaskRepository for InstrumentedStore {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        self.inner.store(task).await
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        self.inner.update(task).await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        tokio::time::sleep(self.read_delay).await;
        self.inner.find_by_id(id).await
    }

    async fn list_by_board(&self, board_id: BoardId) -> TaskRepositoryResult<Vec<Task>> {
        self.inner.list_by_board(board_id).await
    }

    async fn count_by_board(&self, board_id: BoardId) -> TaskRepositoryResult<u32> {
        self.inner.count_by_board(board_id).await
    }

    async fn delete(&self, id: TaskId, placements: &[Placement]) -> TaskRepositoryResult<()> {
        self.inner.delete(id, &self.placements_for(placements)).await
    }

    async fn apply_placements(&self, placements: &[Placement]) -> TaskRepositoryResult<()> {
        self.inner
            .apply_placements(&self.placements_for(placements))
            .await
    }
}

#[async_trait]
impl BoardRepository for InstrumentedStore {
    async fn store_board(&self, board: &Board) -> TaskRepositoryResult<()> {
        self.inner.store_board(board).await
    }

    async fn find_board(&self, id: BoardId) -> TaskRepositoryResult<Option<Board>> {
        self.inner.find_board(id).await
    }
}
