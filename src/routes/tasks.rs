use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::TaskListQuery,
    response::ApiResponse,
    routes::{decode_object, ObjectBody},
    tasks::TaskService,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

/// Retrieves a page of the authenticated user's tasks, newest first.
///
/// ## Query Parameters:
/// - `page` (optional, default 1)
/// - `limit` (optional, default 10)
///
/// Values that are not positive integers fall back to the defaults.
///
/// ## Responses:
/// - `200 OK`: `data` is an array of tasks, `pagination` describes the page.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
#[get("")]
pub async fn get_tasks(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    query: web::Query<TaskListQuery>,
) -> Result<impl Responder, AppError> {
    let page = tasks.list(user.user_id, &query).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::paginated(
        "Tasks retrieved successfully",
        page.items,
        page.pagination,
    )))
}

/// Creates a new task owned by the authenticated user.
///
/// ## Request Body:
/// - `title` (required)
/// - `subject` (required)
/// - `description` (optional, defaults to "")
/// - `priority` (optional: "low", "medium", "high"; defaults to "medium")
///
/// ## Responses:
/// - `201 Created`: `data` is the stored task.
/// - `400 Bad Request`: Missing title/subject or an unknown priority.
#[post("")]
pub async fn create_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    task_data: ObjectBody,
) -> Result<impl Responder, AppError> {
    let task = tasks.create(user.user_id, decode_object(task_data)?).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success("Task created successfully", task)))
}

/// Retrieves one of the authenticated user's tasks.
///
/// ## Responses:
/// - `200 OK`
/// - `400 Bad Request`: `id` is not a well-formed task id.
/// - `404 Not Found`: No such task, or it belongs to someone else.
#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    task_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let task = tasks.get(user.user_id, &task_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Task retrieved successfully", task)))
}

/// Partially updates a task. Only fields present in the body are changed.
///
/// ## Request Body:
/// Any of `title`, `description`, `subject`, `completed`, `priority`.
///
/// ## Responses:
/// - `200 OK`: `data` is the task after the update.
/// - `400 Bad Request`: Malformed id or invalid field value.
/// - `404 Not Found`: No such task, or it belongs to someone else.
#[put("/{id}")]
pub async fn update_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    task_id: web::Path<String>,
    task_data: ObjectBody,
) -> Result<impl Responder, AppError> {
    let task = tasks
        .update(user.user_id, &task_id, decode_object(task_data)?)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Task updated successfully", task)))
}

/// Deletes a task.
///
/// ## Responses:
/// - `200 OK`
/// - `400 Bad Request`: Malformed id.
/// - `404 Not Found`: No such task, or it belongs to someone else.
#[delete("/{id}")]
pub async fn delete_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    task_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    tasks.delete(user.user_id, &task_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("Task deleted successfully")))
}
