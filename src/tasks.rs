//! Owner-scoped task operations.
//!
//! Every operation takes the owner id from the authenticated caller. Single-task
//! operations match on task id *and* owner id, so a task belonging to someone
//! else is reported exactly like a task that does not exist.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, ACCOUNT_GONE};
use crate::models::{CreateTaskRequest, Task, TaskListQuery, TaskUpdate};
use crate::response::Pagination;
use crate::store::{TaskStore, UserStore};

const TASK_NOT_FOUND: &str = "Task not found";

/// One page of a caller's tasks.
#[derive(Debug)]
pub struct TaskPage {
    pub items: Vec<Task>,
    pub pagination: Pagination,
}

pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    users: Arc<dyn UserStore>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskStore>, users: Arc<dyn UserStore>) -> Self {
        Self { tasks, users }
    }

    /// Newest first. An out-of-range page is an empty page, not an error.
    pub async fn list(&self, owner: Uuid, query: &TaskListQuery) -> Result<TaskPage, AppError> {
        let (page, limit) = (query.page(), query.limit());

        let total = self
            .tasks
            .count(owner)
            .await
            .map_err(|e| AppError::from_store("Failed to fetch tasks", e))?;
        let pagination = Pagination::new(page, limit, total);

        let items = self
            .tasks
            .find_many(owner, pagination.skip(), limit)
            .await
            .map_err(|e| AppError::from_store("Failed to fetch tasks", e))?;

        Ok(TaskPage { items, pagination })
    }

    /// Tokens outlive account deletion, so the owner must still exist. The
    /// Postgres foreign key reports the same `UnknownOwner` if the account
    /// disappears between the check and the insert.
    pub async fn create(&self, owner: Uuid, input: CreateTaskRequest) -> Result<Task, AppError> {
        input.validate()?;

        let account = self
            .users
            .find_by_id(owner)
            .await
            .map_err(|e| AppError::from_store("Failed to create task", e))?;
        if account.is_none() {
            log::debug!("refused task for deleted account {}", owner);
            return Err(AppError::Unauthorized(ACCOUNT_GONE.into()));
        }

        let id = self
            .tasks
            .insert(Task::new(input, owner))
            .await
            .map_err(|e| AppError::from_store("Failed to create task", e))?;

        // Re-read so the response reflects exactly what was stored. A concurrent
        // delete between the two calls surfaces as an internal error.
        self.tasks
            .find_one(id, owner)
            .await
            .map_err(|e| AppError::from_store("Failed to create task", e))?
            .ok_or_else(|| AppError::internal("Failed to create task", format!("task {} vanished after insert", id)))
    }

    pub async fn get(&self, owner: Uuid, task_id: &str) -> Result<Task, AppError> {
        let id = parse_task_id(task_id)?;

        self.tasks
            .find_one(id, owner)
            .await
            .map_err(|e| AppError::from_store("Failed to fetch task", e))?
            .ok_or_else(|| AppError::NotFound(TASK_NOT_FOUND.into()))
    }

    /// Writes only the fields present in `update` and always refreshes `updated_at`.
    pub async fn update(&self, owner: Uuid, task_id: &str, update: TaskUpdate) -> Result<Task, AppError> {
        let id = parse_task_id(task_id)?;
        update.validate()?;

        self.tasks
            .update_one(id, owner, &update, Utc::now())
            .await
            .map_err(|e| AppError::from_store("Failed to update task", e))?
            .ok_or_else(|| AppError::NotFound(TASK_NOT_FOUND.into()))
    }

    pub async fn delete(&self, owner: Uuid, task_id: &str) -> Result<(), AppError> {
        let id = parse_task_id(task_id)?;

        let removed = self
            .tasks
            .delete_one(id, owner)
            .await
            .map_err(|e| AppError::from_store("Failed to delete task", e))?;

        if removed {
            Ok(())
        } else {
            Err(AppError::NotFound(TASK_NOT_FOUND.into()))
        }
    }
}

/// Ill-formed ids are refused before any store call.
fn parse_task_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::ValidationError("Invalid task id".into()))
}
