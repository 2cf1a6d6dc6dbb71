//! Task aggregate root.

use super::{BoardId, Position, TaskDomainError, TaskId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Descriptive, caller-editable task fields.
///
/// Dates are opaque to the ordering and attachment logic; the only rule
/// enforced here is that a start date never follows the end date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDetails {
    title: String,
    description: Option<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

impl TaskDetails {
    /// Creates validated details with the given title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank.
    pub fn new(title: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = title.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        Ok(Self {
            title: trimmed.to_owned(),
            description: None,
            start_date: None,
            end_date: None,
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the start and end dates.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvertedDateRange`] when both dates are set
    /// and the start falls after the end.
    pub fn with_dates(
        mut self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Self, TaskDomainError> {
        if let (Some(start), Some(end)) = (start_date, end_date)
            && start > end
        {
            return Err(TaskDomainError::InvertedDateRange);
        }
        self.start_date = start_date;
        self.end_date = end_date;
        Ok(self)
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the start date, if any.
    #[must_use]
    pub const fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    /// Returns the end date, if any.
    #[must_use]
    pub const fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    board_id: BoardId,
    owner_id: Option<UserId>,
    position: Position,
    details: TaskDetails,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Owning board.
    pub board_id: BoardId,
    /// Owning user, if any.
    pub owner_id: Option<UserId>,
    /// Persisted ordinal position.
    pub position: Position,
    /// Persisted descriptive fields.
    pub details: TaskDetails,
    /// Completion timestamp, present iff the task is complete.
    pub completed_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Inputs for a task that has not been placed on a board yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Board the task is appended to.
    pub board_id: BoardId,
    /// Owning user, if any.
    pub owner_id: Option<UserId>,
    /// Descriptive fields.
    pub details: TaskDetails,
}

impl Task {
    /// Creates a task at the given position on its board.
    #[must_use]
    pub fn new(new_task: NewTask, position: Position, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            board_id: new_task.board_id,
            owner_id: new_task.owner_id,
            position,
            details: new_task.details,
            completed_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            board_id: data.board_id,
            owner_id: data.owner_id,
            position: data.position,
            details: data.details,
            completed_at: data.completed_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning board.
    #[must_use]
    pub const fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Returns the owning user, if any.
    #[must_use]
    pub const fn owner_id(&self) -> Option<UserId> {
        self.owner_id
    }

    /// Returns the ordinal position within the owning board.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Returns the descriptive fields.
    #[must_use]
    pub const fn details(&self) -> &TaskDetails {
        &self.details
    }

    /// Returns the completion timestamp, if the task is complete.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns whether the task is marked complete.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Marks the task complete or incomplete.
    ///
    /// Completing an already complete task refreshes the timestamp.
    pub fn set_completion(&mut self, is_complete: bool, clock: &impl Clock) {
        let now = clock.utc();
        self.completed_at = is_complete.then_some(now);
        self.updated_at = now;
    }

    /// Replaces the descriptive fields.
    pub fn update_details(&mut self, details: TaskDetails, clock: &impl Clock) {
        self.details = details;
        self.touch(clock);
    }

    /// Assigns or clears the owning user.
    pub fn assign_owner(&mut self, owner_id: Option<UserId>, clock: &impl Clock) {
        self.owner_id = owner_id;
        self.touch(clock);
    }

    /// Moves the task to a board slot.
    ///
    /// Only the ordering changes; `updated_at` is left alone because
    /// positions describe the board rather than the task itself.
    pub const fn place(&mut self, board_id: BoardId, position: Position) {
        self.board_id = board_id;
        self.position = position;
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
