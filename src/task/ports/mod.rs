//! Port contracts for task ordering and attachments.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod attachments;
pub mod repository;
pub mod users;

pub use attachments::{
    AttachmentDownload, AttachmentStore, AttachmentStoreError, AttachmentStoreResult,
    AttachmentStream,
};
pub use repository::{BoardRepository, TaskRepository, TaskRepositoryError, TaskRepositoryResult};
pub use users::{UserDirectory, UserDirectoryError};
