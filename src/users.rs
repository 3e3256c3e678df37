//! User accounts and their repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Public projection of a [`User`]; never carries the password hash.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        Self { id: u.id.to_string(), username: u.username.clone(), created_at: u.created_at }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the username is taken.
    async fn create(&self, user: NewUser) -> StoreResult<User>;
    async fn find_by_username(&self, username: &str) -> StoreResult<User>;
    async fn find_by_id(&self, id: &Uuid) -> StoreResult<User>;
    async fn set_disabled(&self, id: &Uuid, disabled: bool) -> StoreResult<()>;
    async fn delete(&self, id: &Uuid) -> StoreResult<()>;
}

#[derive(Default)]
struct UserTable {
    by_id: HashMap<Uuid, User>,
    by_username: HashMap<String, Uuid>,
}

/// In-process repository; usernames are unique case-insensitively.
#[derive(Default)]
pub struct MemoryUserRepository {
    inner: RwLock<UserTable>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn username_key(username: &str) -> String {
    username.to_ascii_lowercase()
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut table = self.inner.write();
        let key = username_key(&user.username);
        if table.by_username.contains_key(&key) {
            return Err(StoreError::Conflict(format!("username '{}' is taken", user.username)));
        }
        let record = User {
            id: Uuid::new_v4(),
            username: user.username,
            password_hash: user.password_hash,
            disabled: false,
            created_at: Utc::now(),
        };
        table.by_username.insert(key, record.id);
        table.by_id.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<User> {
        let table = self.inner.read();
        table
            .by_username
            .get(&username_key(username))
            .and_then(|id| table.by_id.get(id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user '{username}'")))
    }

    async fn find_by_id(&self, id: &Uuid) -> StoreResult<User> {
        self.inner.read().by_id.get(id).cloned().ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }

    async fn set_disabled(&self, id: &Uuid, disabled: bool) -> StoreResult<()> {
        let mut table = self.inner.write();
        let user = table.by_id.get_mut(id).ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        user.disabled = disabled;
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> StoreResult<()> {
        let mut table = self.inner.write();
        let user = table.by_id.remove(id).ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        table.by_username.remove(&username_key(&user.username));
        Ok(())
    }
}
