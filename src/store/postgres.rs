use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use uuid::Uuid;

use super::{StoreError, TaskStore, UserStore};
use crate::models::{Task, TaskUpdate, User};

const TASK_COLUMNS: &str =
    "id, user_id, title, description, subject, completed, priority, created_at, updated_at";

const SCHEMA: [&str; 4] = [
    "DO $$ BEGIN
         CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
     EXCEPTION WHEN duplicate_object THEN NULL;
     END $$",
    "CREATE TABLE IF NOT EXISTS users (
         id UUID PRIMARY KEY,
         name TEXT NOT NULL,
         email TEXT NOT NULL CONSTRAINT users_email_key UNIQUE,
         password_hash TEXT NOT NULL,
         created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
     )",
    "CREATE TABLE IF NOT EXISTS tasks (
         id UUID PRIMARY KEY,
         user_id UUID NOT NULL CONSTRAINT tasks_user_id_fkey REFERENCES users(id) ON DELETE CASCADE,
         title TEXT NOT NULL,
         description TEXT NOT NULL DEFAULT '',
         subject TEXT NOT NULL,
         completed BOOLEAN NOT NULL DEFAULT FALSE,
         priority task_priority NOT NULL DEFAULT 'medium',
         created_at TIMESTAMPTZ NOT NULL,
         updated_at TIMESTAMPTZ NOT NULL
     )",
    "CREATE INDEX IF NOT EXISTS tasks_user_created_idx ON tasks (user_id, created_at DESC)",
];

/// Explicitly constructed handle to the PostgreSQL pool.
///
/// The handle starts out unconnected; every store call made before
/// [`Database::connect`] succeeds fails with `StoreError::NotInitialized`.
#[derive(Debug)]
pub struct Database {
    url: String,
    pool: OnceLock<PgPool>,
}

impl Database {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pool: OnceLock::new(),
        }
    }

    /// Opens the pool and makes sure the schema exists. Calling it again is a no-op.
    pub async fn connect(&self) -> Result<&PgPool, StoreError> {
        if let Some(pool) = self.pool.get() {
            return Ok(pool);
        }

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&self.url)
            .await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        log::info!("database connected and schema ensured");

        Ok(self.pool.get_or_init(|| pool))
    }

    pub fn pool(&self) -> Result<&PgPool, StoreError> {
        self.pool.get().ok_or(StoreError::NotInitialized)
    }
}

pub struct PgUserStore {
    db: Arc<Database>,
}

impl PgUserStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, password_hash, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, name, email, password_hash, created_at",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_one(self.db.pool()?)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.db.pool()?)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.db.pool()?)
        .await?;

        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.db.pool()?)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

pub struct PgTaskStore {
    db: Arc<Database>,
}

impl PgTaskStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn insert(&self, task: Task) -> Result<Uuid, StoreError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO tasks (id, user_id, title, description, subject, completed, priority, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING id",
        )
        .bind(task.id)
        .bind(task.user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.subject)
        .bind(task.completed)
        .bind(task.priority)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(self.db.pool()?)
        .await?;

        Ok(id)
    }

    async fn find_one(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, StoreError> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1 AND user_id = $2", TASK_COLUMNS);
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(self.db.pool()?)
            .await?;

        Ok(task)
    }

    async fn find_many(&self, owner: Uuid, skip: u64, limit: u64) -> Result<Vec<Task>, StoreError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
            TASK_COLUMNS
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(owner)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(skip).unwrap_or(i64::MAX))
            .fetch_all(self.db.pool()?)
            .await?;

        Ok(tasks)
    }

    async fn count(&self, owner: Uuid) -> Result<u64, StoreError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
            .bind(owner)
            .fetch_one(self.db.pool()?)
            .await?;

        Ok(total.max(0) as u64)
    }

    async fn update_one(
        &self,
        id: Uuid,
        owner: Uuid,
        update: &TaskUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Task>, StoreError> {
        // Absent fields bind as NULL and COALESCE keeps the stored value.
        let sql = format!(
            "UPDATE tasks
             SET title = COALESCE($1, title),
                 description = COALESCE($2, description),
                 subject = COALESCE($3, subject),
                 completed = COALESCE($4, completed),
                 priority = COALESCE($5, priority),
                 updated_at = $6
             WHERE id = $7 AND user_id = $8
             RETURNING {}",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(&update.title)
            .bind(&update.description)
            .bind(&update.subject)
            .bind(update.completed)
            .bind(update.priority)
            .bind(updated_at)
            .bind(id)
            .bind(owner)
            .fetch_optional(self.db.pool()?)
            .await?;

        Ok(task)
    }

    async fn delete_one(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(self.db.pool()?)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_owner(&self, owner: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE user_id = $1")
            .bind(owner)
            .execute(self.db.pool()?)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_before_connect_is_not_initialized() {
        let db = Database::new("postgres://localhost/studytasks");
        assert!(matches!(db.pool(), Err(StoreError::NotInitialized)));
    }

    #[actix_rt::test]
    async fn test_stores_refuse_work_before_connect() {
        let db = Arc::new(Database::new("postgres://localhost/studytasks"));
        let users = PgUserStore::new(db.clone());
        let tasks = PgTaskStore::new(db);

        assert!(matches!(
            users.find_by_email("a@example.com").await,
            Err(StoreError::NotInitialized)
        ));
        assert!(matches!(
            tasks.count(Uuid::new_v4()).await,
            Err(StoreError::NotInitialized)
        ));
    }
}
