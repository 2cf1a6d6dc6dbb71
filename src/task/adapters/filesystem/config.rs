//! Configuration for the filesystem attachment store.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Maximum accepted upload size: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Outcome of uploading under a name that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Replace the existing file atomically.
    #[default]
    Overwrite,
    /// Append the new bytes to the existing file.
    Append,
    /// Refuse the upload.
    Reject,
}

/// Attachment store configuration.
///
/// # Examples
///
/// ```
/// use taskboard::task::adapters::filesystem::{AttachmentConfig, CollisionPolicy};
///
/// let config = AttachmentConfig::default();
/// assert_eq!(config.root.as_str(), "uploads");
/// assert_eq!(config.collision, CollisionPolicy::Overwrite);
///
/// let legacy = AttachmentConfig::default().with_collision_policy(CollisionPolicy::Append);
/// assert_eq!(legacy.max_upload_bytes, 10 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentConfig {
    /// Directory holding `{project_id}/{task_id}/{name}` trees.
    pub root: Utf8PathBuf,
    /// Largest accepted payload in bytes.
    pub max_upload_bytes: usize,
    /// What to do when a name is uploaded twice.
    pub collision: CollisionPolicy,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            root: Utf8PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            collision: CollisionPolicy::default(),
        }
    }
}

impl AttachmentConfig {
    /// Sets the storage root.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Sets the upload size limit.
    #[must_use]
    pub const fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Sets the collision policy.
    #[must_use]
    pub const fn with_collision_policy(mut self, collision: CollisionPolicy) -> Self {
        self.collision = collision;
        self
    }
}
