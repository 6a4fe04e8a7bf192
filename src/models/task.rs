use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Low priority.
    Low,
    /// Medium priority, used when the creator does not choose one.
    #[default]
    Medium,
    /// High priority.
    High,
}

/// Input structure for creating a task.
///
/// Required text fields default to empty when absent from the body so that a
/// missing field and an empty one are reported through the same validation path.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Must be between 1 and 200 characters.
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title is required (max 200 characters)"))]
    pub title: String,

    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    pub description: Option<String>,

    /// The study topic, e.g. "Databases". Between 1 and 100 characters.
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "subject is required (max 100 characters)"))]
    pub subject: String,

    pub priority: Option<TaskPriority>,
}

/// A partial update: only fields present in the request are written.
#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200, message = "title must not be empty (max 200 characters)"))]
    pub title: Option<String>,

    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 100, message = "subject must not be empty (max 100 characters)"))]
    pub subject: Option<String>,

    pub completed: Option<bool>,

    pub priority: Option<TaskPriority>,
}

/// Represents a task as stored and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    /// Owner of the task. Never changes after creation.
    pub user_id: Uuid,
    pub title: String,
    /// Empty when the creator gave none.
    pub description: String,
    pub subject: String,
    pub completed: bool,
    pub priority: TaskPriority,
    /// Timestamp of when the task was created.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new `Task` owned by `user_id`.
    /// The task starts incomplete, priority falls back to medium, and both timestamps are now.
    pub fn new(input: CreateTaskRequest, user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: input.title,
            description: input.description.unwrap_or_default(),
            subject: input.subject,
            completed: false,
            priority: input.priority.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Writes the present fields of `update` and stamps `updated_at`.
    pub fn apply(&mut self, update: &TaskUpdate, updated_at: DateTime<Utc>) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(subject) = &update.subject {
            self.subject = subject.clone();
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        self.updated_at = updated_at;
    }
}

/// Raw `page`/`limit` query parameters.
///
/// Kept as strings so that garbage like `?page=abc` falls back to the default
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl TaskListQuery {
    pub const DEFAULT_PAGE: u64 = 1;
    pub const DEFAULT_LIMIT: u64 = 10;

    pub fn page(&self) -> u64 {
        coerce_positive(self.page.as_deref(), Self::DEFAULT_PAGE)
    }

    pub fn limit(&self) -> u64 {
        coerce_positive(self.limit.as_deref(), Self::DEFAULT_LIMIT)
    }
}

/// Parses `raw` as an integer; anything unparsable or non-positive yields `default`.
pub fn coerce_positive(raw: Option<&str>, default: u64) -> u64 {
    match raw.map(str::trim).and_then(|s| s.parse::<i64>().ok()) {
        Some(value) if value > 0 => value as u64,
        _ => default,
    }
}
