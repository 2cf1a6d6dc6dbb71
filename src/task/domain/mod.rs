//! Domain model for board-scoped task ordering and task attachments.
//!
//! The task domain models task records, their dense per-board ordering and
//! the naming rules for attachment files while keeping all infrastructure
//! concerns outside of the domain boundary.

mod attachment;
mod board;
mod error;
mod ids;
mod ordering;
mod position;
mod task;

pub use attachment::{AttachmentEntry, AttachmentKey, AttachmentName};
pub(crate) use attachment::STAGING_PREFIX;
pub use board::Board;
pub use error::TaskDomainError;
pub use ids::{BoardId, ProjectId, TaskId, UserId};
pub use ordering::{BoardOrdering, MovePlan, plan_move};
pub use position::{Placement, Position};
pub use task::{NewTask, PersistedTaskData, Task, TaskDetails};
