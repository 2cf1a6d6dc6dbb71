//! In-memory user directory.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::UserId,
    ports::{UserDirectory, UserDirectoryError},
};

/// User directory backed by a set of known identifiers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashSet<UserId>>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory that knows the given users.
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            users: Arc::new(RwLock::new(users.into_iter().collect())),
        }
    }

    /// Registers a user.
    ///
    /// # Errors
    ///
    /// Returns [`UserDirectoryError`] when the internal lock is poisoned.
    pub fn insert(&self, user_id: UserId) -> Result<(), UserDirectoryError> {
        let mut users = self
            .users
            .write()
            .map_err(|err| UserDirectoryError::new(std::io::Error::other(err.to_string())))?;
        users.insert(user_id);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn exists(&self, user_id: UserId) -> Result<bool, UserDirectoryError> {
        let users = self
            .users
            .read()
            .map_err(|err| UserDirectoryError::new(std::io::Error::other(err.to_string())))?;
        Ok(users.contains(&user_id))
    }
}
