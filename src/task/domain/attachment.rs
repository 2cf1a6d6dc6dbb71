//! Attachment naming and listing values.
//!
//! Attachments are not records: an attachment is a file at
//! `{root}/{project_id}/{task_id}/{name}`. The types here make sure callers can
//! only name a single file inside that directory.

use super::{ProjectId, TaskDomainError, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix reserved for in-flight upload staging files.
pub(crate) const STAGING_PREFIX: &str = ".upload-";

/// Directory key owning a task's attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttachmentKey {
    /// Project owning the task's board.
    pub project_id: ProjectId,
    /// Task owning the attachments.
    pub task_id: TaskId,
}

impl AttachmentKey {
    /// Creates an attachment key.
    #[must_use]
    pub const fn new(project_id: ProjectId, task_id: TaskId) -> Self {
        Self {
            project_id,
            task_id,
        }
    }
}

impl fmt::Display for AttachmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project_id, self.task_id)
    }
}

/// Validated attachment file name.
///
/// A name is exactly one path segment: it is non-empty, is neither `.` nor
/// `..`, contains no `/`, `\` or NUL, and does not use the staging prefix.
///
/// # Examples
///
/// ```
/// use taskboard::task::domain::AttachmentName;
///
/// let name = AttachmentName::new("brief.pdf").expect("valid name");
/// assert_eq!(name.extension(), "pdf");
/// assert!(AttachmentName::new("../escape").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttachmentName(String);

impl AttachmentName {
    /// Creates a validated attachment name.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidAttachmentName`] when the name is not
    /// a plain single path segment.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let name = value.into();
        let is_valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0'])
            && !name.starts_with(STAGING_PREFIX);
        if !is_valid {
            return Err(TaskDomainError::InvalidAttachmentName(name));
        }
        Ok(Self(name))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the substring after the last `.`, or `""` without one.
    #[must_use]
    pub fn extension(&self) -> &str {
        self.0.rsplit_once('.').map_or("", |(_, extension)| extension)
    }

    /// Returns the download media type, `application/{extension}`.
    ///
    /// Names without an extension map to `application/octet-stream`.
    #[must_use]
    pub fn media_type(&self) -> String {
        match self.extension() {
            "" => "application/octet-stream".to_owned(),
            extension => format!("application/{}", extension.to_ascii_lowercase()),
        }
    }
}

impl TryFrom<String> for AttachmentName {
    type Error = TaskDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AttachmentName> for String {
    fn from(value: AttachmentName) -> Self {
        value.0
    }
}

impl AsRef<str> for AttachmentName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for AttachmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One file in a task's attachment directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentEntry {
    name: AttachmentName,
    #[serde(rename = "type")]
    kind: String,
}

impl AttachmentEntry {
    /// Creates a listing entry, inferring the type from the name.
    #[must_use]
    pub fn new(name: AttachmentName) -> Self {
        let kind = name.extension().to_owned();
        Self { name, kind }
    }

    /// Returns the file name.
    #[must_use]
    pub const fn name(&self) -> &AttachmentName {
        &self.name
    }

    /// Returns the inferred type, the text after the last `.` in the name.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }
}
