//! Attachment store port for task-scoped binary files.

use crate::task::domain::{AttachmentEntry, AttachmentKey, AttachmentName};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::fmt;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Result type for attachment store operations.
pub type AttachmentStoreResult<T> = Result<T, AttachmentStoreError>;

/// Lazily produced attachment contents.
///
/// The stream reads the file in chunks; it can be restarted only by calling
/// [`AttachmentStore::get`] again.
pub type AttachmentStream = BoxStream<'static, io::Result<Bytes>>;

/// An attachment opened for download.
pub struct AttachmentDownload {
    name: AttachmentName,
    len: u64,
    stream: AttachmentStream,
}

impl AttachmentDownload {
    /// Wraps an opened attachment stream.
    #[must_use]
    pub fn new(name: AttachmentName, len: u64, stream: AttachmentStream) -> Self {
        Self { name, len, stream }
    }

    /// Returns the attachment name.
    #[must_use]
    pub const fn name(&self) -> &AttachmentName {
        &self.name
    }

    /// Returns the media type derived from the name's extension.
    #[must_use]
    pub fn media_type(&self) -> String {
        self.name.media_type()
    }

    /// Returns the file length at the time it was opened.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    /// Returns whether the file was empty when opened.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Consumes the download, returning the byte stream.
    #[must_use]
    pub fn into_stream(self) -> AttachmentStream {
        self.stream
    }
}

impl fmt::Debug for AttachmentDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentDownload")
            .field("name", &self.name)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Task-scoped file storage contract.
///
/// Implementations own the directory for each [`AttachmentKey`]; callers
/// address files by key and validated name only.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Stores `bytes` under `name`, creating the task directory on demand.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentStoreError::PayloadTooLarge`] before touching the
    /// filesystem when `bytes` exceeds the configured limit, and
    /// [`AttachmentStoreError::AlreadyExists`] when the collision policy
    /// rejects an existing name.
    async fn put(
        &self,
        key: AttachmentKey,
        name: &AttachmentName,
        bytes: Bytes,
    ) -> AttachmentStoreResult<AttachmentEntry>;

    /// Opens an attachment for streaming.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentStoreError::DirectoryNotFound`] or
    /// [`AttachmentStoreError::FileNotFound`] when either is missing.
    async fn get(
        &self,
        key: AttachmentKey,
        name: &AttachmentName,
    ) -> AttachmentStoreResult<AttachmentDownload>;

    /// Lists a task's attachments sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentStoreError::DirectoryNotFound`] when the task has
    /// never received an upload. An existing empty directory yields an empty
    /// list.
    async fn list(&self, key: AttachmentKey) -> AttachmentStoreResult<Vec<AttachmentEntry>>;

    /// Deletes one attachment, leaving its directories in place.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentStoreError::DirectoryNotFound`] or
    /// [`AttachmentStoreError::FileNotFound`] when either is missing.
    async fn delete(&self, key: AttachmentKey, name: &AttachmentName) -> AttachmentStoreResult<()>;

    /// Removes a task's whole attachment directory.
    ///
    /// Returns `false` when there was nothing to remove.
    async fn purge(&self, key: AttachmentKey) -> AttachmentStoreResult<bool>;
}

/// Errors returned by attachment store implementations.
#[derive(Debug, Clone, Error)]
pub enum AttachmentStoreError {
    /// The upload exceeds the configured size limit.
    #[error("attachment size {actual_bytes} exceeds limit of {limit_bytes} bytes")]
    PayloadTooLarge {
        /// The payload size in bytes.
        actual_bytes: usize,
        /// The maximum allowed size.
        limit_bytes: usize,
    },

    /// The task has no attachment directory.
    #[error("no attachments directory for {0}")]
    DirectoryNotFound(AttachmentKey),

    /// The named attachment does not exist.
    #[error("attachment '{name}' not found for {key}")]
    FileNotFound {
        /// Directory key searched.
        key: AttachmentKey,
        /// Missing file name.
        name: AttachmentName,
    },

    /// The collision policy rejected an existing name.
    #[error("attachment '{name}' already exists for {key}")]
    AlreadyExists {
        /// Directory key written to.
        key: AttachmentKey,
        /// Conflicting file name.
        name: AttachmentName,
    },

    /// Filesystem failure.
    #[error("attachment I/O error: {0}")]
    Io(Arc<io::Error>),
}

impl From<io::Error> for AttachmentStoreError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}
