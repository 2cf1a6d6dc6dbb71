//! Shared test helpers for in-memory integration tests.

use std::sync::Arc;

use camino::Utf8PathBuf;
use mockable::DefaultClock;
use rstest::fixture;
use taskboard::task::{
    adapters::{
        filesystem::{AttachmentConfig, FilesystemAttachmentStore},
        memory::{InMemoryTaskRepository, InMemoryUserDirectory},
    },
    domain::{Board, BoardId, ProjectId},
    ports::{BoardRepository, TaskRepository},
    services::TaskLifecycleService,
};
use tempfile::TempDir;

/// Service wired to in-memory records and a temporary upload root.
pub type TestService = TaskLifecycleService<
    InMemoryTaskRepository,
    InMemoryUserDirectory,
    FilesystemAttachmentStore,
    DefaultClock,
>;

/// Everything a test needs to drive the service and inspect its state.
pub struct Env {
    pub uploads: TempDir,
    pub repository: Arc<InMemoryTaskRepository>,
    pub service: TestService,
}

/// Provides a fresh service per test.
///
/// # Panics
///
/// Panics when the temporary upload root cannot be created.
#[fixture]
pub fn env() -> Env {
    let uploads = tempfile::tempdir().expect("create temp upload root");
    let root =
        Utf8PathBuf::from_path_buf(uploads.path().to_path_buf()).expect("utf-8 temp path");
    let attachments = FilesystemAttachmentStore::open(AttachmentConfig::default().with_root(root))
        .expect("open attachment store");
    let repository = Arc::new(InMemoryTaskRepository::new());
    let service = TaskLifecycleService::new(
        Arc::clone(&repository),
        Arc::new(InMemoryUserDirectory::new()),
        Arc::new(attachments),
        Arc::new(DefaultClock),
    );
    Env {
        uploads,
        repository,
        service,
    }
}

/// Stores a new board and returns it.
///
/// # Errors
///
/// Returns an error when the repository rejects the board.
pub async fn new_board(env: &Env) -> Result<Board, eyre::Report> {
    let board = Board::new(ProjectId::new());
    env.repository.store_board(&board).await?;
    Ok(board)
}

/// Asserts that a board's positions are exactly `0..N`.
///
/// # Errors
///
/// Returns an error describing the first gap or duplicate.
pub async fn ensure_dense(env: &Env, board_id: BoardId) -> Result<(), eyre::Report> {
    let tasks = env.repository.list_by_board(board_id).await?;
    for (index, task) in tasks.iter().enumerate() {
        let expected = u32::try_from(index)?;
        eyre::ensure!(
            task.position().value() == expected,
            "board {board_id} has {} at index {index}",
            task.position()
        );
    }
    Ok(())
}
