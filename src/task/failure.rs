//! Coarse failure taxonomy shared by every error in the task module.
//!
//! Callers branch on [`FailureKind`] instead of matching each layer's error
//! enum, e.g. to choose a response status.

use crate::task::ports::{AttachmentStoreError, TaskRepositoryError, UserDirectoryError};
use std::fmt;

/// Distinguishing kind of a task module failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// A referenced task, board, user or file is absent.
    NotFound,
    /// The record store refused to insert a new task.
    CreateFailed,
    /// An upload exceeded the size limit.
    PayloadTooLarge,
    /// A write conflicted with existing state.
    Conflict,
    /// Storage or filesystem I/O failed.
    Io,
    /// The request itself was malformed.
    InvalidInput,
}

impl FailureKind {
    /// Returns a stable snake-case label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::CreateFailed => "create_failed",
            Self::PayloadTooLarge => "payload_too_large",
            Self::Conflict => "conflict",
            Self::Io => "io",
            Self::InvalidInput => "invalid_input",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TaskRepositoryError {
    /// Returns the failure kind of this error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound(_) | Self::BoardNotFound(_) => FailureKind::NotFound,
            Self::DuplicateTask(_)
            | Self::DuplicatePosition { .. }
            | Self::DuplicateBoard(_)
            | Self::Conflict(_) => FailureKind::Conflict,
            Self::Persistence(_) => FailureKind::Io,
        }
    }
}

impl AttachmentStoreError {
    /// Returns the failure kind of this error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::PayloadTooLarge { .. } => FailureKind::PayloadTooLarge,
            Self::DirectoryNotFound(_) | Self::FileNotFound { .. } => FailureKind::NotFound,
            Self::AlreadyExists { .. } => FailureKind::Conflict,
            Self::Io(_) => FailureKind::Io,
        }
    }
}

impl UserDirectoryError {
    /// Returns the failure kind of this error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        FailureKind::Io
    }
}
