//! Shared world state for task lifecycle BDD scenarios.

use std::path::PathBuf;
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
    domain::{AttachmentKey, AttachmentName, Board, ProjectId, Task},
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

/// Scenario world for task lifecycle behaviour tests.
pub struct LifecycleWorld {
    pub service: TestTaskService,
    pub repository: Arc<InMemoryTaskRepository>,
    pub uploads: TempDir,
    pub task: Option<Task>,
    pub attachment_key: Option<AttachmentKey>,
    pub last_failure: Option<FailureKind>,
}

impl LifecycleWorld {
    /// Creates a world without tasks.
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
            uploads,
            task: None,
            attachment_key: None,
            last_failure: None,
        }
    }

    /// Stores a board in a fresh project and creates one task on it.
    pub fn seed_task(&mut self) -> Result<(), eyre::Report> {
        let board = Board::new(ProjectId::new());
        run_async(self.repository.store_board(&board)).wrap_err("store board")?;
        let task = run_async(
            self.service
                .create_task(CreateTaskRequest::new(board.id(), "Attachment holder")),
        )
        .wrap_err("create task")?;
        self.attachment_key = Some(AttachmentKey::new(board.project_id(), task.id()));
        self.task = Some(task);
        Ok(())
    }

    /// Returns the scenario task.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }

    /// Returns the directory holding the task's attachments.
    pub fn task_dir(&self) -> Result<PathBuf, eyre::Report> {
        let key = self
            .attachment_key
            .ok_or_else(|| eyre::eyre!("missing attachment key in scenario world"))?;
        Ok(self
            .uploads
            .path()
            .join(key.project_id.to_string())
            .join(key.task_id.to_string()))
    }
}

impl Default for LifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> LifecycleWorld {
    LifecycleWorld::default()
}

/// Parses a scenario file name.
pub fn attachment_name(name: &str) -> Result<AttachmentName, eyre::Report> {
    AttachmentName::new(name).wrap_err_with(|| format!("invalid attachment name {name}"))
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
