/// Task endpoints
///
/// # Endpoints
///
/// - `GET    /taskboard/tasks` - List all tasks
/// - `POST   /taskboard/tasks` - Create a task at the end of its board
/// - `GET    /taskboard/tasks/:taskid` - Get one task
/// - `PUT    /taskboard/tasks/:taskid` - Update editable fields (optimistic)
/// - `DELETE /taskboard/tasks/:taskid` - Delete a task
/// - `GET    /taskboard/boards/:boardid/tasks` - Tasks of one board by position
///
/// Board and position are not editable here; use `PUT /taskboard/orders/tasks`.

use crate::{
    app::AppState,
    error::{validate_request, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_shared::db::pool::begin_write;
use taskboard_shared::models::task::Task;
use taskboard_shared::services::task::{NewTask, TaskChanges, TaskService};
use validator::Validate;

/// Create task request
///
/// Without `boardId` the task lands on Icebox.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 8000, message = "Description must be at most 8000 characters"))]
    pub description: String,

    #[validate(length(min = 1, max = 32, message = "Board id must be 1-32 characters"))]
    pub board_id: Option<String>,

    #[validate(length(max = 32, message = "Assignee id must be at most 32 characters"))]
    pub assignee_user_id: Option<String>,

    #[serde(default)]
    pub is_closed: bool,

    #[serde(default)]
    #[validate(range(min = 0, message = "Estimate must not be negative"))]
    pub estimate_size: i64,
}

/// Update task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 8000, message = "Description must be at most 8000 characters"))]
    pub description: String,

    #[validate(length(max = 32, message = "Assignee id must be at most 32 characters"))]
    pub assignee_user_id: Option<String>,

    #[serde(default)]
    pub is_closed: bool,

    #[serde(default)]
    #[validate(range(min = 0, message = "Estimate must not be negative"))]
    pub estimate_size: i64,

    #[validate(range(min = 1, message = "Version must be at least 1"))]
    pub version: i64,
}

/// Task as returned by the API
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub assignee_user_id: Option<String>,
    pub board_id: String,
    pub display_order: i64,
    pub created_date: DateTime<Utc>,
    pub is_closed: bool,
    pub version: i64,
    pub estimate_size: i64,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            name: task.name,
            description: task.description,
            assignee_user_id: task.assignee_user_id,
            board_id: task.board_id,
            display_order: task.display_order,
            created_date: task.created_date,
            is_closed: task.is_closed,
            version: task.version,
            estimate_size: task.estimate_size,
        }
    }
}

fn to_responses(tasks: Vec<Task>) -> Vec<TaskResponse> {
    tasks.into_iter().map(TaskResponse::from).collect()
}

pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Json<Vec<TaskResponse>>> {
    let mut conn = state.db.acquire().await?;
    let tasks = TaskService::new(&mut conn).find_tasks(&[]).await?;

    Ok(Json(to_responses(tasks)))
}

/// Lists one board's tasks ordered by position
///
/// # Errors
///
/// - `404 Not Found`: No such board
pub async fn list_board_tasks(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let mut conn = state.db.acquire().await?;
    let tasks = TaskService::new(&mut conn).find_board_tasks(&board_id).await?;

    Ok(Json(to_responses(tasks)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<TaskResponse>> {
    let mut conn = state.db.acquire().await?;
    let task = TaskService::new(&mut conn).find_task(&task_id).await?;

    Ok(Json(task.into()))
}

/// Creates a task at the end of its board
///
/// # Errors
///
/// - `404 Not Found`: The board or assignee does not exist
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    validate_request(&req)?;

    let mut tx = begin_write(&state.db).await?;
    let task = TaskService::new(&mut tx)
        .create_task(NewTask {
            name: req.name,
            description: req.description,
            board_id: req.board_id,
            assignee_user_id: req.assignee_user_id,
            is_closed: req.is_closed,
            estimate_size: req.estimate_size,
        })
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(task.into())))
}

/// Updates a task's editable fields
///
/// # Errors
///
/// - `404 Not Found`: No such task or assignee
/// - `409 Conflict`: The task changed since `version`
pub async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    validate_request(&req)?;

    let mut tx = begin_write(&state.db).await?;
    let task = TaskService::new(&mut tx)
        .update_task(
            &task_id,
            TaskChanges {
                name: req.name,
                description: req.description,
                assignee_user_id: req.assignee_user_id,
                is_closed: req.is_closed,
                estimate_size: req.estimate_size,
                version: req.version,
            },
        )
        .await?;
    tx.commit().await?;

    Ok(Json(task.into()))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut tx = begin_write(&state.db).await?;
    TaskService::new(&mut tx).delete_task(&task_id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
