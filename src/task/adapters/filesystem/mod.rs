//! Local filesystem adapter for task attachments.

mod config;
mod store;

pub use config::{AttachmentConfig, CollisionPolicy, DEFAULT_MAX_UPLOAD_BYTES};
pub use store::FilesystemAttachmentStore;
