//! Task lifecycle coordination across the record store, the position
//! service and the attachment store.

use super::positions::{MoveTaskRequest, PositionService, PositionServiceError};
use crate::task::{
    domain::{
        AttachmentEntry, AttachmentKey, AttachmentName, Board, BoardId, NewTask, Placement, Task,
        TaskDetails, TaskDomainError, TaskId, UserId,
    },
    failure::FailureKind,
    ports::{
        AttachmentDownload, AttachmentStore, AttachmentStoreError, BoardRepository,
        TaskRepository, TaskRepositoryError, UserDirectory, UserDirectoryError,
    },
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Request payload for creating a task at the end of a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    board_id: BoardId,
    title: String,
    description: Option<String>,
    owner_id: Option<UserId>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(board_id: BoardId, title: impl Into<String>) -> Self {
        Self {
            board_id,
            title: title.into(),
            description: None,
            owner_id: None,
            start_date: None,
            end_date: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the owning user.
    #[must_use]
    pub const fn with_owner(mut self, owner_id: UserId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    /// Sets the start and end dates.
    #[must_use]
    pub const fn with_dates(
        mut self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }
}

/// Request payload for editing a task's descriptive fields and owner.
///
/// Fields left unset keep their stored values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    task_id: TaskId,
    title: Option<String>,
    description: Option<Option<String>>,
    owner_id: Option<Option<UserId>>,
    dates: Option<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)>,
}

impl UpdateTaskRequest {
    /// Creates an empty update for a task.
    #[must_use]
    pub const fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            title: None,
            description: None,
            owner_id: None,
            dates: None,
        }
    }

    /// Replaces the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replaces the description, or clears it with `None`.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Assigns the task to a user, or clears the owner with `None`.
    #[must_use]
    pub const fn with_owner(mut self, owner_id: Option<UserId>) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    /// Replaces both dates.
    #[must_use]
    pub const fn with_dates(
        mut self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Self {
        self.dates = Some((start_date, end_date));
        self
    }
}

/// Outcome of [`TaskLifecycleService::delete_task`].
///
/// The task's attachments are left on disk; `attachment_key` addresses them
/// for a later [`TaskLifecycleService::purge_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedTask {
    /// The task as it was stored before deletion.
    pub task: Task,
    /// Directory key of the task's attachments.
    pub attachment_key: AttachmentKey,
}

/// A task together with its attachment listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskWithAttachments {
    /// The task record.
    pub task: Task,
    /// Attachments, or `None` when the task never received an upload.
    pub attachments: Option<Vec<AttachmentEntry>>,
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// The referenced board does not exist.
    #[error("board not found: {0}")]
    BoardNotFound(BoardId),
    /// The referenced owner does not exist.
    #[error("user not found: {0}")]
    UserNotFound(UserId),
    /// The record store refused the new task.
    #[error("failed to create task: {0}")]
    CreateFailed(TaskRepositoryError),
    /// Attachments cannot be purged while their task exists.
    #[error("task {0} still exists")]
    TaskStillExists(TaskId),
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// A position operation failed.
    #[error(transparent)]
    Positions(PositionServiceError),
    /// The record store failed.
    #[error(transparent)]
    Repository(TaskRepositoryError),
    /// The user directory failed.
    #[error(transparent)]
    Users(#[from] UserDirectoryError),
    /// The attachment store failed.
    #[error(transparent)]
    Attachments(#[from] AttachmentStoreError),
}

impl From<TaskRepositoryError> for TaskLifecycleError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::NotFound(task_id) => Self::TaskNotFound(task_id),
            TaskRepositoryError::BoardNotFound(board_id) => Self::BoardNotFound(board_id),
            other => Self::Repository(other),
        }
    }
}

impl From<PositionServiceError> for TaskLifecycleError {
    fn from(err: PositionServiceError) -> Self {
        match err {
            PositionServiceError::TaskNotFound(task_id) => Self::TaskNotFound(task_id),
            PositionServiceError::BoardNotFound(board_id) => Self::BoardNotFound(board_id),
            PositionServiceError::Domain(domain) => Self::Domain(domain),
            other @ PositionServiceError::Repository(_) => Self::Positions(other),
        }
    }
}

impl TaskLifecycleError {
    /// Returns the failure kind of this error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::TaskNotFound(_) | Self::BoardNotFound(_) | Self::UserNotFound(_) => {
                FailureKind::NotFound
            }
            Self::CreateFailed(_) => FailureKind::CreateFailed,
            Self::TaskStillExists(_) => FailureKind::Conflict,
            Self::Domain(_) => FailureKind::InvalidInput,
            Self::Positions(err) => err.kind(),
            Self::Repository(err) => err.kind(),
            Self::Users(err) => err.kind(),
            Self::Attachments(err) => err.kind(),
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
pub struct TaskLifecycleService<R, U, A, C>
where
    R: TaskRepository + BoardRepository,
    U: UserDirectory,
    A: AttachmentStore,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    users: Arc<U>,
    attachments: Arc<A>,
    positions: PositionService<R>,
    clock: Arc<C>,
}

impl<R, U, A, C> Clone for TaskLifecycleService<R, U, A, C>
where
    R: TaskRepository + BoardRepository,
    U: UserDirectory,
    A: AttachmentStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            users: Arc::clone(&self.users),
            attachments: Arc::clone(&self.attachments),
            positions: self.positions.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, U, A, C> TaskLifecycleService<R, U, A, C>
where
    R: TaskRepository + BoardRepository,
    U: UserDirectory,
    A: AttachmentStore,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub fn new(repository: Arc<R>, users: Arc<U>, attachments: Arc<A>, clock: Arc<C>) -> Self {
        let positions = PositionService::new(Arc::clone(&repository));
        Self {
            repository,
            users,
            attachments,
            positions,
            clock,
        }
    }

    /// Returns the position service sharing this service's board locks.
    #[must_use]
    pub const fn positions(&self) -> &PositionService<R> {
        &self.positions
    }

    /// Creates a task at the end of its board.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] for invalid details,
    /// [`TaskLifecycleError::BoardNotFound`] or
    /// [`TaskLifecycleError::UserNotFound`] for unknown references, and
    /// [`TaskLifecycleError::CreateFailed`] when the record store rejects the
    /// insert.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskLifecycleResult<Task> {
        let mut details = TaskDetails::new(request.title)?
            .with_dates(request.start_date, request.end_date)?;
        if let Some(description) = request.description {
            details = details.with_description(description);
        }
        self.find_board(request.board_id).await?;
        if let Some(owner_id) = request.owner_id {
            self.ensure_user(owner_id).await?;
        }

        let _guard = self.positions.lock_board(request.board_id).await;
        let position = self.positions.append_position(request.board_id).await?;
        let new_task = NewTask {
            board_id: request.board_id,
            owner_id: request.owner_id,
            details,
        };
        let task = Task::new(new_task, position, &*self.clock);

        self.repository.store(&task).await.map_err(|err| {
            warn!(board_id = %request.board_id, error = %err, "lifecycle: task insert rejected");
            match err {
                TaskRepositoryError::BoardNotFound(board_id) => {
                    TaskLifecycleError::BoardNotFound(board_id)
                }
                other => TaskLifecycleError::CreateFailed(other),
            }
        })?;
        debug!(task_id = %task.id(), board_id = %task.board_id(), position = %position, "lifecycle: created task");
        Ok(task)
    }

    /// Retrieves a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] when the task does not
    /// exist.
    pub async fn get_task(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.find_task(task_id).await
    }

    /// Lists a board's tasks by position ascending.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::BoardNotFound`] when the board does not
    /// exist.
    pub async fn list_tasks(&self, board_id: BoardId) -> TaskLifecycleResult<Vec<Task>> {
        self.find_board(board_id).await?;
        Ok(self.repository.list_by_board(board_id).await?)
    }

    /// Edits a task's descriptive fields and owner.
    ///
    /// Holds the task's board lock across the read and the write, so
    /// concurrent edits of one task apply in turn.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] or
    /// [`TaskLifecycleError::UserNotFound`] for unknown references, and
    /// [`TaskLifecycleError::Domain`] when the new details are invalid.
    pub async fn update_task(&self, request: UpdateTaskRequest) -> TaskLifecycleResult<Task> {
        let (mut task, _guards) = self.positions.lock_task_boards(request.task_id, None).await?;

        if request.title.is_some() || request.description.is_some() || request.dates.is_some() {
            let current = task.details();
            let title = request
                .title
                .unwrap_or_else(|| current.title().to_owned());
            let (start_date, end_date) = request
                .dates
                .unwrap_or((current.start_date(), current.end_date()));
            let description = request
                .description
                .unwrap_or_else(|| current.description().map(str::to_owned));

            let mut details = TaskDetails::new(title)?.with_dates(start_date, end_date)?;
            if let Some(text) = description {
                details = details.with_description(text);
            }
            task.update_details(details, &*self.clock);
        }

        if let Some(owner_id) = request.owner_id {
            if let Some(user_id) = owner_id {
                self.ensure_user(user_id).await?;
            }
            task.assign_owner(owner_id, &*self.clock);
        }

        self.repository.update(&task).await?;
        debug!(task_id = %task.id(), "lifecycle: updated task");
        Ok(task)
    }

    /// Deletes a task and closes the gap it leaves on its board.
    ///
    /// The delete and the renumbering of the remaining tasks commit together.
    /// Attachments stay on disk.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] when the task does not
    /// exist, or a store error when the transaction fails; the task and the
    /// board are then left as they were.
    pub async fn delete_task(&self, task_id: TaskId) -> TaskLifecycleResult<DeletedTask> {
        let (task, _guards) = self.positions.lock_task_boards(task_id, None).await?;
        let board = self.find_board(task.board_id()).await?;
        let attachment_key = AttachmentKey::new(board.project_id(), task.id());

        let plan = self.positions.removal_plan(board.id(), task_id).await?;
        self.repository
            .delete(task_id, plan.placements())
            .await
            .inspect_err(|err| warn!(task_id = %task_id, error = %err, "lifecycle: delete failed"))?;
        debug!(
            task_id = %task_id,
            board_id = %board.id(),
            rewritten = plan.placements().len(),
            "lifecycle: deleted task"
        );

        Ok(DeletedTask {
            task,
            attachment_key,
        })
    }

    /// Marks a task complete or incomplete.
    ///
    /// Completing stamps the current time, even when the task was already
    /// complete; un-completing clears the timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] when the task does not
    /// exist.
    pub async fn set_completion(
        &self,
        task_id: TaskId,
        is_complete: bool,
    ) -> TaskLifecycleResult<Task> {
        let (mut task, _guards) = self.positions.lock_task_boards(task_id, None).await?;
        task.set_completion(is_complete, &*self.clock);
        self.repository.update(&task).await?;
        debug!(task_id = %task_id, is_complete, "lifecycle: set completion");
        Ok(task)
    }

    /// Moves a task; see [`PositionService::move_task`].
    ///
    /// # Errors
    ///
    /// Propagates position service failures.
    pub async fn move_task(&self, request: MoveTaskRequest) -> TaskLifecycleResult<Task> {
        Ok(self.positions.move_task(request).await?)
    }

    /// Applies a bulk reorder; see [`PositionService::reorder`].
    ///
    /// # Errors
    ///
    /// Propagates position service failures.
    pub async fn reorder_tasks(&self, placements: &[Placement]) -> TaskLifecycleResult<()> {
        Ok(self.positions.reorder(placements).await?)
    }

    /// Stores an attachment for a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] before touching the
    /// filesystem when the task does not exist, or the attachment store's
    /// error.
    pub async fn upload_file(
        &self,
        task_id: TaskId,
        name: &AttachmentName,
        bytes: Bytes,
    ) -> TaskLifecycleResult<AttachmentEntry> {
        let key = self.attachment_key(task_id).await?;
        let size = bytes.len();
        let entry = self
            .attachments
            .put(key, name, bytes)
            .await
            .inspect_err(|err| warn!(key = %key, name = %name, error = %err, "lifecycle: upload failed"))?;
        debug!(key = %key, name = %name, size, "lifecycle: uploaded file");
        Ok(entry)
    }

    /// Opens a task's attachment for streaming.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] when the task does not
    /// exist, or the attachment store's error.
    pub async fn download_file(
        &self,
        task_id: TaskId,
        name: &AttachmentName,
    ) -> TaskLifecycleResult<AttachmentDownload> {
        let key = self.attachment_key(task_id).await?;
        Ok(self.attachments.get(key, name).await?)
    }

    /// Lists a task's attachments.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] when the task does not
    /// exist, or [`AttachmentStoreError::DirectoryNotFound`] when it never
    /// received an upload.
    pub async fn list_files(&self, task_id: TaskId) -> TaskLifecycleResult<Vec<AttachmentEntry>> {
        let key = self.attachment_key(task_id).await?;
        Ok(self.attachments.list(key).await?)
    }

    /// Deletes one of a task's attachments.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] when the task does not
    /// exist, or the attachment store's error.
    pub async fn delete_file(
        &self,
        task_id: TaskId,
        name: &AttachmentName,
    ) -> TaskLifecycleResult<()> {
        let key = self.attachment_key(task_id).await?;
        self.attachments.delete(key, name).await?;
        debug!(key = %key, name = %name, "lifecycle: deleted file");
        Ok(())
    }

    /// Removes the attachment directory of a deleted task.
    ///
    /// Returns `false` when there was nothing to remove.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskStillExists`] when the task record
    /// is still present, or the attachment store's error.
    pub async fn purge_files(&self, key: AttachmentKey) -> TaskLifecycleResult<bool> {
        if self.repository.find_by_id(key.task_id).await?.is_some() {
            warn!(key = %key, "lifecycle: refused to purge attachments of live task");
            return Err(TaskLifecycleError::TaskStillExists(key.task_id));
        }
        let removed = self.attachments.purge(key).await?;
        debug!(key = %key, removed, "lifecycle: purged attachments");
        Ok(removed)
    }

    /// Lists a board's tasks with each task's attachments.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::BoardNotFound`] when the board does not
    /// exist, or the first attachment listing failure other than a missing
    /// directory.
    pub async fn list_board_with_files(
        &self,
        board_id: BoardId,
    ) -> TaskLifecycleResult<Vec<TaskWithAttachments>> {
        let board = self.find_board(board_id).await?;
        let tasks = self.repository.list_by_board(board_id).await?;

        let mut listing = Vec::with_capacity(tasks.len());
        for task in tasks {
            let key = AttachmentKey::new(board.project_id(), task.id());
            let attachments = match self.attachments.list(key).await {
                Ok(entries) => Some(entries),
                Err(AttachmentStoreError::DirectoryNotFound(_)) => None,
                Err(err) => return Err(err.into()),
            };
            listing.push(TaskWithAttachments { task, attachments });
        }
        Ok(listing)
    }

    async fn attachment_key(&self, task_id: TaskId) -> TaskLifecycleResult<AttachmentKey> {
        let task = self.find_task(task_id).await?;
        let board = self.find_board(task.board_id()).await?;
        Ok(AttachmentKey::new(board.project_id(), task.id()))
    }

    async fn find_task(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(TaskLifecycleError::TaskNotFound(task_id))
    }

    async fn find_board(&self, board_id: BoardId) -> TaskLifecycleResult<Board> {
        self.repository
            .find_board(board_id)
            .await?
            .ok_or(TaskLifecycleError::BoardNotFound(board_id))
    }

    async fn ensure_user(&self, user_id: UserId) -> TaskLifecycleResult<()> {
        if self.users.exists(user_id).await? {
            Ok(())
        } else {
            Err(TaskLifecycleError::UserNotFound(user_id))
        }
    }
}
