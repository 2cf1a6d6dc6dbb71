//! `PostgreSQL` integration tests for task lifecycle flows.

use std::sync::Arc;

use crate::postgres::helpers::{PgContext, pg_context};
use camino::Utf8PathBuf;
use mockable::DefaultClock;
use rstest::rstest;
use taskboard::task::{
    adapters::{
        filesystem::{AttachmentConfig, FilesystemAttachmentStore},
        memory::InMemoryUserDirectory,
        postgres::PostgresTaskRepository,
    },
    domain::{Board, Position, ProjectId},
    ports::BoardRepository,
    services::{CreateTaskRequest, MoveTaskRequest, TaskLifecycleService, UpdateTaskRequest},
};
use tempfile::TempDir;

type PgService = TaskLifecycleService<
    PostgresTaskRepository,
    InMemoryUserDirectory,
    FilesystemAttachmentStore,
    DefaultClock,
>;

fn service(pg_context: &PgContext, uploads: &TempDir) -> PgService {
    let root = Utf8PathBuf::from_path_buf(uploads.path().to_path_buf()).expect("utf-8 temp path");
    let attachments = FilesystemAttachmentStore::open(AttachmentConfig::default().with_root(root))
        .expect("open attachment store");
    TaskLifecycleService::new(
        Arc::clone(&pg_context.repository),
        Arc::new(InMemoryUserDirectory::new()),
        Arc::new(attachments),
        Arc::new(DefaultClock),
    )
}

#[rstest]
fn create_move_and_delete_keep_board_dense(pg_context: PgContext) {
    let uploads = tempfile::tempdir().expect("create temp dir");
    let service = service(&pg_context, &uploads);
    let board = Board::new(ProjectId::new());
    let rt = &pg_context.runtime;
    rt.block_on(pg_context.repository.store_board(&board))
        .expect("store board");

    let mut ids = Vec::new();
    for title in ["a", "b", "c", "d"] {
        let task = rt
            .block_on(service.create_task(CreateTaskRequest::new(board.id(), title)))
            .expect("create task");
        ids.push(task.id());
    }
    let [a, b, c, d] = [ids[0], ids[1], ids[2], ids[3]];

    rt.block_on(service.move_task(MoveTaskRequest::new(a, Position::new(3))))
        .expect("move a to the end");
    rt.block_on(service.delete_task(c)).expect("delete c");

    assert_eq!(
        pg_context.slots(board.id()).expect("list board"),
        vec![(b, 0), (d, 1), (a, 2)]
    );
}

#[rstest]
fn edits_and_completion_round_trip(pg_context: PgContext) {
    let uploads = tempfile::tempdir().expect("create temp dir");
    let service = service(&pg_context, &uploads);
    let board = Board::new(ProjectId::new());
    let rt = &pg_context.runtime;
    rt.block_on(pg_context.repository.store_board(&board))
        .expect("store board");
    let created = rt
        .block_on(service.create_task(
            CreateTaskRequest::new(board.id(), "Draft").with_description("scratch"),
        ))
        .expect("create task");

    rt.block_on(service.update_task(
        UpdateTaskRequest::new(created.id())
            .with_title("Final")
            .with_description(None),
    ))
    .expect("update task");
    rt.block_on(service.set_completion(created.id(), true))
        .expect("complete task");

    let stored = rt
        .block_on(service.get_task(created.id()))
        .expect("get task");
    assert_eq!(stored.details().title(), "Final");
    assert_eq!(stored.details().description(), None);
    assert!(stored.completed_at().is_some());
    assert_eq!(stored.position(), created.position());
}
