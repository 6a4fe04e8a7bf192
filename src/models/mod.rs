pub mod task;
pub mod user;

pub use task::{CreateTaskRequest, Task, TaskListQuery, TaskPriority, TaskUpdate};
pub use user::{NewUser, User, UserProfile};
