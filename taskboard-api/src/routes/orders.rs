/// Ordering endpoints
///
/// # Endpoints
///
/// - `PUT /taskboard/orders/boards` - Rewrite the board order
/// - `PUT /taskboard/orders/tasks` - Move one task
///
/// # Examples
///
/// ```text
/// PUT /taskboard/orders/boards
/// { "boardIds": ["board_icebox", "board_doing", "board_todo", "board_done"] }
///
/// PUT /taskboard/orders/tasks
/// {
///   "taskId": "9f2c...",
///   "fromBoardId": "board_todo",
///   "fromDisplayOrder": 2,
///   "toBoardId": "board_doing",
///   "toDisplayOrder": 1
/// }
/// ```
///
/// The `from` position is taken as given. Clients must send the position they
/// last read; a stale value misorders the board.

use crate::{
    app::AppState,
    error::{validate_request, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use taskboard_shared::db::pool::begin_write;
use taskboard_shared::models::task::TaskMove;
use taskboard_shared::services::board::BoardService;
use taskboard_shared::services::task::TaskService;
use validator::Validate;

/// Board order request: every board id, in the desired order
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBoardOrdersRequest {
    #[validate(length(min = 1, message = "At least one board id is required"))]
    pub board_ids: Vec<String>,
}

/// Task move request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskOrdersRequest {
    #[validate(length(min = 1, max = 32, message = "Task id must be 1-32 characters"))]
    pub task_id: String,

    #[validate(length(min = 1, max = 32, message = "Board id must be 1-32 characters"))]
    pub from_board_id: String,

    #[validate(range(min = 1, message = "Display orders start at 1"))]
    pub from_display_order: i64,

    #[validate(length(min = 1, max = 32, message = "Board id must be 1-32 characters"))]
    pub to_board_id: String,

    #[validate(range(min = 1, message = "Display orders start at 1"))]
    pub to_display_order: i64,
}

/// Reorders boards
///
/// # Errors
///
/// - `400 Bad Request`: An id is listed twice
/// - `404 Not Found`: An id names no board
pub async fn update_board_orders(
    State(state): State<AppState>,
    Json(req): Json<UpdateBoardOrdersRequest>,
) -> ApiResult<StatusCode> {
    validate_request(&req)?;

    let mut tx = begin_write(&state.db).await?;
    BoardService::new(&mut tx).reorder_boards(&req.board_ids).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Moves a task within or across boards
///
/// # Errors
///
/// - `404 Not Found`: Either board or the task does not exist
pub async fn update_task_orders(
    State(state): State<AppState>,
    Json(req): Json<UpdateTaskOrdersRequest>,
) -> ApiResult<StatusCode> {
    validate_request(&req)?;

    let task_move = TaskMove {
        task_id: req.task_id,
        from_board_id: req.from_board_id,
        from_display_order: req.from_display_order,
        to_board_id: req.to_board_id,
        to_display_order: req.to_display_order,
    };

    let mut tx = begin_write(&state.db).await?;
    TaskService::new(&mut tx).move_task(&task_move).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
