//! Port for the external user directory.

use crate::task::domain::UserId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Read-only lookup of users who may own tasks.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns whether the user exists.
    async fn exists(&self, user_id: UserId) -> Result<bool, UserDirectoryError>;
}

/// Failure reported by a user directory.
#[derive(Debug, Clone, Error)]
#[error("user directory unavailable: {0}")]
pub struct UserDirectoryError(pub Arc<dyn std::error::Error + Send + Sync>);

impl UserDirectoryError {
    /// Wraps a lookup failure.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
