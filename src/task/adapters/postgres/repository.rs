//! `PostgreSQL` repository implementation for task and board storage.

use super::{
    models::{BoardRow, TaskChangeset, TaskRow},
    schema::{boards, tasks},
};
use crate::task::{
    domain::{
        Board, BoardId, PersistedTaskData, Placement, Position, ProjectId, Task, TaskDetails,
        TaskId, UserId,
    },
    ports::{BoardRepository, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use std::collections::BTreeSet;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

const BOARD_POSITION_CONSTRAINT: &str = "tasks_board_position_unique";
const BOARD_FOREIGN_KEY: &str = "tasks_board_id_fkey";

/// `PostgreSQL`-backed task and board repository.
///
/// The `(board_id, position)` uniqueness constraint is deferred to commit,
/// which lets [`TaskRepository::apply_placements`] pass through transient
/// duplicates while it rewrites a board inside one transaction.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation,
                ref info,
            ) => Self::Conflict(info.constraint_name().unwrap_or("unknown").to_owned()),
            _ => Self::persistence(err),
        }
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let board_id = task.board_id();
        let position = task.position();
        let new_row = to_row(task)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if is_constraint(info.as_ref(), BOARD_POSITION_CONSTRAINT) =>
                    {
                        TaskRepositoryError::DuplicatePosition { board_id, position }
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, ref info)
                        if is_constraint(info.as_ref(), BOARD_FOREIGN_KEY) =>
                    {
                        TaskRepositoryError::BoardNotFound(board_id)
                    }
                    _ => TaskRepositoryError::from(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let changeset = to_changeset(task);
        self.run_blocking(move |connection| {
            let affected = diesel::update(tasks::table.find(task_id.into_inner()))
                .set(&changeset)
                .execute(connection)?;
            if affected == 0 {
                return Err(TaskRepositoryError::NotFound(task_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list_by_board(&self, board_id: BoardId) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::board_id.eq(board_id.into_inner()))
                .order((tasks::position.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn count_by_board(&self, board_id: BoardId) -> TaskRepositoryResult<u32> {
        self.run_blocking(move |connection| {
            let count = tasks::table
                .filter(tasks::board_id.eq(board_id.into_inner()))
                .count()
                .get_result::<i64>(connection)?;
            u32::try_from(count).map_err(TaskRepositoryError::persistence)
        })
        .await
    }

    async fn delete(&self, id: TaskId, placements: &[Placement]) -> TaskRepositoryResult<()> {
        let batch = placements.to_vec();
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx_conn| {
                let affected =
                    diesel::delete(tasks::table.find(id.into_inner())).execute(tx_conn)?;
                if affected == 0 {
                    return Err(TaskRepositoryError::NotFound(id));
                }
                write_placements(tx_conn, &batch)
            })
        })
        .await
    }

    async fn apply_placements(&self, placements: &[Placement]) -> TaskRepositoryResult<()> {
        if placements.is_empty() {
            return Ok(());
        }
        let batch = placements.to_vec();
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx_conn| {
                write_placements(tx_conn, &batch)
            })
        })
        .await
    }
}

#[async_trait]
impl BoardRepository for PostgresTaskRepository {
    async fn store_board(&self, board: &Board) -> TaskRepositoryResult<()> {
        let board_id = board.id();
        let row = BoardRow {
            id: board_id.into_inner(),
            project_id: board.project_id().into_inner(),
        };
        self.run_blocking(move |connection| {
            diesel::insert_into(boards::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateBoard(board_id)
                    }
                    _ => TaskRepositoryError::from(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_board(&self, id: BoardId) -> TaskRepositoryResult<Option<Board>> {
        self.run_blocking(move |connection| {
            let row = boards::table
                .find(id.into_inner())
                .select(BoardRow::as_select())
                .first::<BoardRow>(connection)
                .optional()?;
            Ok(row.map(|board| {
                Board::from_persisted(
                    BoardId::from_uuid(board.id),
                    ProjectId::from_uuid(board.project_id),
                )
            }))
        })
        .await
    }
}

/// Writes every placement on an open transaction.
///
/// The `(board_id, position)` constraint is only checked when the enclosing
/// transaction commits.
fn write_placements(
    connection: &mut PgConnection,
    placements: &[Placement],
) -> TaskRepositoryResult<()> {
    let destinations: BTreeSet<BoardId> =
        placements.iter().map(|placement| placement.board_id).collect();
    for board_id in destinations {
        ensure_board_exists(connection, board_id)?;
    }

    for placement in placements {
        let position = to_column_position(placement.position)?;
        let affected = diesel::update(tasks::table.find(placement.task_id.into_inner()))
            .set((
                tasks::board_id.eq(placement.board_id.into_inner()),
                tasks::position.eq(position),
            ))
            .execute(connection)?;
        if affected == 0 {
            return Err(TaskRepositoryError::NotFound(placement.task_id));
        }
    }
    Ok(())
}

fn ensure_board_exists(connection: &mut PgConnection, board_id: BoardId) -> TaskRepositoryResult<()> {
    let exists = diesel::select(diesel::dsl::exists(
        boards::table.find(board_id.into_inner()),
    ))
    .get_result::<bool>(connection)?;
    if exists {
        Ok(())
    } else {
        Err(TaskRepositoryError::BoardNotFound(board_id))
    }
}

fn is_constraint(info: &dyn DatabaseErrorInformation, name: &str) -> bool {
    info.constraint_name()
        .is_some_and(|constraint| constraint == name)
}

fn to_column_position(position: Position) -> TaskRepositoryResult<i32> {
    i32::try_from(position.value()).map_err(TaskRepositoryError::persistence)
}

pub(super) fn to_row(task: &Task) -> TaskRepositoryResult<TaskRow> {
    let details = task.details();
    Ok(TaskRow {
        id: task.id().into_inner(),
        board_id: task.board_id().into_inner(),
        owner_id: task.owner_id().map(UserId::into_inner),
        position: to_column_position(task.position())?,
        title: details.title().to_owned(),
        description: details.description().map(ToOwned::to_owned),
        start_date: details.start_date(),
        end_date: details.end_date(),
        completed_at: task.completed_at(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

fn to_changeset(task: &Task) -> TaskChangeset {
    let details = task.details();
    TaskChangeset {
        owner_id: task.owner_id().map(UserId::into_inner),
        title: details.title().to_owned(),
        description: details.description().map(ToOwned::to_owned),
        start_date: details.start_date(),
        end_date: details.end_date(),
        completed_at: task.completed_at(),
        updated_at: task.updated_at(),
    }
}

pub(super) fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        board_id,
        owner_id,
        position: persisted_position,
        title,
        description,
        start_date,
        end_date,
        completed_at,
        created_at,
        updated_at,
    } = row;

    let position = u32::try_from(persisted_position)
        .map(Position::new)
        .map_err(TaskRepositoryError::persistence)?;
    let mut draft = TaskDetails::new(title).map_err(TaskRepositoryError::persistence)?;
    if let Some(text) = description {
        draft = draft.with_description(text);
    }
    let details = draft
        .with_dates(start_date, end_date)
        .map_err(TaskRepositoryError::persistence)?;

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        board_id: BoardId::from_uuid(board_id),
        owner_id: owner_id.map(UserId::from_uuid),
        position,
        details,
        completed_at,
        created_at,
        updated_at,
    }))
}
