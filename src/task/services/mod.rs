//! Application services for task ordering and lifecycle orchestration.

mod lifecycle;
mod positions;

pub use lifecycle::{
    CreateTaskRequest, DeletedTask, TaskLifecycleError, TaskLifecycleResult,
    TaskLifecycleService, TaskWithAttachments, UpdateTaskRequest,
};
pub use positions::{
    MoveTaskRequest, PositionService, PositionServiceError, PositionServiceResult,
};
