//! Shared world state for board ordering BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use camino::Utf8PathBuf;
use eyre::WrapErr;
use mockable::DefaultClock;
use rstest::fixture;
use taskboard::task::{
    FailureKind,
    adapters::{
        filesystem::{AttachmentConfig, FilesystemAttachmentStore},
        memory::{InMemoryTaskRepository, InMemoryUserDirectory},
    },
    domain::{Board, BoardId, ProjectId, TaskId},
    ports::BoardRepository,
    services::{CreateTaskRequest, TaskLifecycleService},
};
use tempfile::TempDir;

/// Service type used by the BDD world.
pub type TestTaskService = TaskLifecycleService<
    InMemoryTaskRepository,
    InMemoryUserDirectory,
    FilesystemAttachmentStore,
    DefaultClock,
>;

/// Scenario world for board ordering behaviour tests.
pub struct BoardWorld {
    pub service: TestTaskService,
    pub repository: Arc<InMemoryTaskRepository>,
    pub board: Option<BoardId>,
    pub second_board: Option<BoardId>,
    pub tasks: HashMap<String, TaskId>,
    pub last_failure: Option<FailureKind>,
    _uploads: TempDir,
}

impl BoardWorld {
    /// Creates a world without boards.
    ///
    /// # Panics
    ///
    /// Panics when the temporary upload root cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let uploads = tempfile::tempdir().expect("create temp upload root");
        let root = Utf8PathBuf::from_path_buf(uploads.path().to_path_buf())
            .expect("utf-8 temp path");
        let attachments =
            FilesystemAttachmentStore::open(AttachmentConfig::default().with_root(root))
                .expect("open attachment store");
        let repository = Arc::new(InMemoryTaskRepository::new());
        let service = TaskLifecycleService::new(
            Arc::clone(&repository),
            Arc::new(InMemoryUserDirectory::new()),
            Arc::new(attachments),
            Arc::new(DefaultClock),
        );

        Self {
            service,
            repository,
            board: None,
            second_board: None,
            tasks: HashMap::new(),
            last_failure: None,
            _uploads: uploads,
        }
    }

    /// Stores a new board holding tasks named by a comma-separated list.
    pub fn seed_board(&mut self, titles: &str) -> Result<BoardId, eyre::Report> {
        let board = Board::new(ProjectId::new());
        run_async(self.repository.store_board(&board)).wrap_err("store board")?;
        for title in split_titles(titles) {
            self.create_task(board.id(), title)?;
        }
        Ok(board.id())
    }

    /// Creates a task at the end of a board and remembers it by title.
    pub fn create_task(&mut self, board_id: BoardId, title: &str) -> Result<TaskId, eyre::Report> {
        let task = run_async(
            self.service
                .create_task(CreateTaskRequest::new(board_id, title)),
        )
        .wrap_err_with(|| format!("create task {title}"))?;
        self.tasks.insert(title.to_owned(), task.id());
        Ok(task.id())
    }

    /// Returns the task remembered under `title`.
    pub fn task_id(&self, title: &str) -> Result<TaskId, eyre::Report> {
        self.tasks
            .get(title)
            .copied()
            .ok_or_else(|| eyre::eyre!("unknown task {title} in scenario world"))
    }

    /// Returns the primary board.
    pub fn board(&self) -> Result<BoardId, eyre::Report> {
        self.board
            .ok_or_else(|| eyre::eyre!("missing board in scenario world"))
    }

    /// Returns the titles on a board in position order.
    pub fn titles_on(&self, board_id: BoardId) -> Result<Vec<String>, eyre::Report> {
        let tasks = run_async(self.service.list_tasks(board_id)).wrap_err("list board tasks")?;
        Ok(tasks
            .iter()
            .map(|task| task.details().title().to_owned())
            .collect())
    }
}

impl Default for BoardWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> BoardWorld {
    BoardWorld::default()
}

/// Splits a comma-separated title list.
pub fn split_titles(titles: &str) -> impl Iterator<Item = &str> {
    titles
        .split(',')
        .map(str::trim)
        .filter(|title| !title.is_empty())
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
