//! Directory-per-task attachment store on the local filesystem.

use super::{AttachmentConfig, CollisionPolicy};
use crate::task::{
    domain::{AttachmentEntry, AttachmentKey, AttachmentName, STAGING_PREFIX},
    locks::KeyedLocks,
    ports::{AttachmentDownload, AttachmentStore, AttachmentStoreError, AttachmentStoreResult},
};
use async_trait::async_trait;
use bytes::Bytes;
use camino::Utf8PathBuf;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use futures::StreamExt;
use std::io::{self, Write};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};
use uuid::Uuid;

/// Attachment store rooted at a single directory.
///
/// Files live at `{root}/{project_id}/{task_id}/{name}`. All access goes
/// through a capability handle on the root, so no operation can leave it.
/// Uploads are staged in the task directory and renamed into place, which
/// keeps partially written files invisible to readers.
#[derive(Debug, Clone)]
pub struct FilesystemAttachmentStore {
    root: Arc<Dir>,
    config: AttachmentConfig,
    locks: Arc<KeyedLocks<AttachmentKey>>,
}

impl FilesystemAttachmentStore {
    /// Opens the store, creating the configured root if absent.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while creating or opening the root.
    pub fn open(config: AttachmentConfig) -> io::Result<Self> {
        Dir::create_ambient_dir_all(&config.root, ambient_authority())?;
        let root = Dir::open_ambient_dir(&config.root, ambient_authority())?;
        Ok(Self::from_dir(root, config))
    }

    /// Wraps an already opened root directory.
    ///
    /// The `root` field of `config` is kept for reference only.
    #[must_use]
    pub fn from_dir(root: Dir, config: AttachmentConfig) -> Self {
        Self {
            root: Arc::new(root),
            config,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &AttachmentConfig {
        &self.config
    }

    async fn run_blocking<F, T>(&self, f: F) -> AttachmentStoreResult<T>
    where
        F: FnOnce(&Dir) -> AttachmentStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let root = Arc::clone(&self.root);
        tokio::task::spawn_blocking(move || f(&root))
            .await
            .map_err(|err| AttachmentStoreError::from(io::Error::other(err)))?
    }
}

fn task_dir_path(key: AttachmentKey) -> Utf8PathBuf {
    let mut path = Utf8PathBuf::from(key.project_id.to_string());
    path.push(key.task_id.to_string());
    path
}

fn open_task_dir(root: &Dir, key: AttachmentKey) -> AttachmentStoreResult<Dir> {
    root.open_dir(task_dir_path(key)).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => AttachmentStoreError::DirectoryNotFound(key),
        _ => AttachmentStoreError::from(err),
    })
}

fn file_not_found(key: AttachmentKey, name: &AttachmentName) -> AttachmentStoreError {
    AttachmentStoreError::FileNotFound {
        key,
        name: name.clone(),
    }
}

fn put_blocking(
    root: &Dir,
    key: AttachmentKey,
    name: &AttachmentName,
    bytes: &[u8],
    policy: CollisionPolicy,
) -> AttachmentStoreResult<()> {
    let dir_path = task_dir_path(key);
    root.create_dir_all(&dir_path)?;
    let dir = root.open_dir(&dir_path)?;

    let existing = match dir.open(name.as_str()) {
        Ok(file) => Some(file),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => return Err(err.into()),
    };
    if policy == CollisionPolicy::Reject && existing.is_some() {
        return Err(AttachmentStoreError::AlreadyExists {
            key,
            name: name.clone(),
        });
    }
    let prefix = match (policy, existing) {
        (CollisionPolicy::Append, Some(file)) => Some(file),
        _ => None,
    };

    let staging_name = format!("{STAGING_PREFIX}{}.tmp", Uuid::new_v4());
    let staged = write_staging(&dir, &staging_name, prefix, bytes)
        .and_then(|()| dir.rename(&staging_name, &dir, name.as_str()));
    if let Err(err) = staged {
        if let Err(cleanup) = dir.remove_file(&staging_name)
            && cleanup.kind() != io::ErrorKind::NotFound
        {
            warn!(attachment_key = %key, staging = %staging_name, error = %cleanup, "attachments: staging cleanup failed");
        }
        return Err(err.into());
    }
    Ok(())
}

fn write_staging(
    dir: &Dir,
    staging_name: &str,
    prefix: Option<cap_std::fs_utf8::File>,
    bytes: &[u8],
) -> io::Result<()> {
    let mut staging = dir.create(staging_name)?;
    if let Some(mut existing) = prefix {
        io::copy(&mut existing, &mut staging)?;
    }
    staging.write_all(bytes)?;
    staging.sync_all()
}

fn open_blocking(
    root: &Dir,
    key: AttachmentKey,
    name: &AttachmentName,
) -> AttachmentStoreResult<(std::fs::File, u64)> {
    let dir = open_task_dir(root, key)?;
    let file = dir.open(name.as_str()).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => file_not_found(key, name),
        _ => AttachmentStoreError::from(err),
    })?;
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        return Err(file_not_found(key, name));
    }
    Ok((file.into_std(), metadata.len()))
}

fn list_blocking(root: &Dir, key: AttachmentKey) -> AttachmentStoreResult<Vec<AttachmentEntry>> {
    let dir = open_task_dir(root, key)?;
    let mut entries = Vec::new();
    for item in dir.entries()? {
        let entry = item?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name()?;
        if file_name.starts_with(STAGING_PREFIX) {
            continue;
        }
        match AttachmentName::new(file_name) {
            Ok(name) => entries.push(AttachmentEntry::new(name)),
            Err(err) => debug!(attachment_key = %key, error = %err, "attachments: skipping entry"),
        }
    }
    entries.sort_by(|left, right| left.name().cmp(right.name()));
    Ok(entries)
}

fn delete_blocking(
    root: &Dir,
    key: AttachmentKey,
    name: &AttachmentName,
) -> AttachmentStoreResult<()> {
    let dir = open_task_dir(root, key)?;
    dir.remove_file(name.as_str())
        .map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => file_not_found(key, name),
            _ => AttachmentStoreError::from(err),
        })
}

fn purge_blocking(root: &Dir, key: AttachmentKey) -> AttachmentStoreResult<bool> {
    match root.remove_dir_all(task_dir_path(key)) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err.into()),
    }
}

#[async_trait]
impl AttachmentStore for FilesystemAttachmentStore {
    async fn put(
        &self,
        key: AttachmentKey,
        name: &AttachmentName,
        bytes: Bytes,
    ) -> AttachmentStoreResult<AttachmentEntry> {
        let limit_bytes = self.config.max_upload_bytes;
        if bytes.len() > limit_bytes {
            warn!(attachment_key = %key, name = %name, size = bytes.len(), limit = limit_bytes, "attachments: upload rejected as too large");
            return Err(AttachmentStoreError::PayloadTooLarge {
                actual_bytes: bytes.len(),
                limit_bytes,
            });
        }

        let _guard = self.locks.acquire(&key).await;
        let policy = self.config.collision;
        let size = bytes.len();
        let target = name.clone();
        self.run_blocking(move |root| put_blocking(root, key, &target, &bytes, policy))
            .await?;
        debug!(attachment_key = %key, name = %name, size, ?policy, "attachments: stored");
        Ok(AttachmentEntry::new(name.clone()))
    }

    async fn get(
        &self,
        key: AttachmentKey,
        name: &AttachmentName,
    ) -> AttachmentStoreResult<AttachmentDownload> {
        let target = name.clone();
        let (file, len) = self
            .run_blocking(move |root| open_blocking(root, key, &target))
            .await?;
        let stream = ReaderStream::new(tokio::fs::File::from_std(file)).boxed();
        Ok(AttachmentDownload::new(name.clone(), len, stream))
    }

    async fn list(&self, key: AttachmentKey) -> AttachmentStoreResult<Vec<AttachmentEntry>> {
        self.run_blocking(move |root| list_blocking(root, key)).await
    }

    async fn delete(&self, key: AttachmentKey, name: &AttachmentName) -> AttachmentStoreResult<()> {
        let _guard = self.locks.acquire(&key).await;
        let target = name.clone();
        self.run_blocking(move |root| delete_blocking(root, key, &target))
            .await?;
        debug!(attachment_key = %key, name = %name, "attachments: deleted");
        Ok(())
    }

    async fn purge(&self, key: AttachmentKey) -> AttachmentStoreResult<bool> {
        let _guard = self.locks.acquire(&key).await;
        let removed = self.run_blocking(move |root| purge_blocking(root, key)).await?;
        debug!(attachment_key = %key, removed, "attachments: purged task directory");
        Ok(removed)
    }
}
