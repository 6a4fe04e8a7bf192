//! Persistence for users and tasks.
//!
//! Services depend on the `UserStore` and `TaskStore` traits, never on a
//! concrete backend. Two backends exist: PostgreSQL through `sqlx`, and an
//! in-process map used by the test suite and for quick local runs.
//!
//! Every task operation that addresses a single task takes both the task id
//! and the owner id; a store must only match a record when both agree.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

use crate::models::{Task, TaskUpdate, User};

pub use memory::{MemoryTaskStore, MemoryUserStore};
pub use postgres::{Database, PgTaskStore, PgUserStore};

/// Constraint names as created by the Postgres schema bootstrap.
pub(crate) const USERS_EMAIL_KEY: &str = "users_email_key";
pub(crate) const TASKS_OWNER_FKEY: &str = "tasks_user_id_fkey";

#[derive(Debug)]
pub enum StoreError {
    /// The storage handle was used before `Database::connect` succeeded.
    NotInitialized,
    /// Another user already holds this email.
    DuplicateEmail,
    /// The task's owner has no account.
    UnknownOwner,
    Database(sqlx::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::NotInitialized => write!(f, "storage has not been initialized"),
            StoreError::DuplicateEmail => write!(f, "email already exists"),
            StoreError::UnknownOwner => write!(f, "task owner does not exist"),
            StoreError::Database(e) => write!(f, "database error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() && db.constraint() == Some(USERS_EMAIL_KEY) => {
                StoreError::DuplicateEmail
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() && db.constraint() == Some(TASKS_OWNER_FKEY) => {
                StoreError::UnknownOwner
            }
            _ => StoreError::Database(error),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists `user`. Fails with `DuplicateEmail` if the email is taken.
    async fn insert(&self, user: User) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persists `task` and returns its identity. Fails with `UnknownOwner`
    /// when the backend enforces ownership and the owner is gone.
    async fn insert(&self, task: Task) -> Result<Uuid, StoreError>;

    async fn find_one(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, StoreError>;

    /// Tasks of `owner`, newest first.
    async fn find_many(&self, owner: Uuid, skip: u64, limit: u64) -> Result<Vec<Task>, StoreError>;

    async fn count(&self, owner: Uuid) -> Result<u64, StoreError>;

    /// Applies `update` and returns the post-image, or `None` when nothing matched.
    async fn update_one(
        &self,
        id: Uuid,
        owner: Uuid,
        update: &TaskUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Task>, StoreError>;

    /// Returns whether a record was removed.
    async fn delete_one(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError>;

    /// Removes every task of `owner` and returns how many were removed.
    async fn delete_by_owner(&self, owner: Uuid) -> Result<u64, StoreError>;
}
