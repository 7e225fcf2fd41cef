/// Board endpoints
///
/// # Endpoints
///
/// - `GET    /taskboard/boards` - List boards by position
/// - `POST   /taskboard/boards` - Create a board at the end
/// - `GET    /taskboard/boards/:boardid` - Get one board
/// - `PUT    /taskboard/boards/:boardid` - Update name/closed flag (optimistic)
/// - `DELETE /taskboard/boards/:boardid` - Delete, moving its tasks to Icebox

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
use taskboard_shared::models::board::Board;
use taskboard_shared::services::board::{BoardChanges, BoardService, NewBoard};
use validator::Validate;

/// Create board request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBoardRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[serde(default)]
    pub is_closed: bool,
}

/// Update board request
///
/// `version` is the version the client last read.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBoardRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[serde(default)]
    pub is_closed: bool,

    #[validate(range(min = 1, message = "Version must be at least 1"))]
    pub version: i64,
}

/// Board as returned by the API
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardResponse {
    pub id: String,
    pub name: String,
    pub display_order: i64,
    pub is_system: bool,
    pub is_closed: bool,
    pub created_date: DateTime<Utc>,
    pub version: i64,
}

impl From<Board> for BoardResponse {
    fn from(board: Board) -> Self {
        Self {
            id: board.id,
            name: board.name,
            display_order: board.display_order,
            is_system: board.is_system,
            is_closed: board.is_closed,
            created_date: board.created_date,
            version: board.version,
        }
    }
}

pub async fn list_boards(State(state): State<AppState>) -> ApiResult<Json<Vec<BoardResponse>>> {
    let mut conn = state.db.acquire().await?;
    let boards = BoardService::new(&mut conn).find_boards(&[]).await?;

    Ok(Json(boards.into_iter().map(BoardResponse::from).collect()))
}

pub async fn get_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
) -> ApiResult<Json<BoardResponse>> {
    let mut conn = state.db.acquire().await?;
    let board = BoardService::new(&mut conn).find_board(&board_id).await?;

    Ok(Json(board.into()))
}

/// Creates a board
///
/// # Errors
///
/// - `409 Conflict`: A board with this name exists
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_board(
    State(state): State<AppState>,
    Json(req): Json<CreateBoardRequest>,
) -> ApiResult<(StatusCode, Json<BoardResponse>)> {
    validate_request(&req)?;

    let mut tx = begin_write(&state.db).await?;
    let board = BoardService::new(&mut tx)
        .create_board(NewBoard {
            name: req.name,
            is_closed: req.is_closed,
        })
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(board.into())))
}

/// Updates a board
///
/// # Errors
///
/// - `404 Not Found`: No such board
/// - `409 Conflict`: The board changed since `version`, or the name is taken
pub async fn update_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    Json(req): Json<UpdateBoardRequest>,
) -> ApiResult<Json<BoardResponse>> {
    validate_request(&req)?;

    let mut tx = begin_write(&state.db).await?;
    let board = BoardService::new(&mut tx)
        .update_board(
            &board_id,
            BoardChanges {
                name: req.name,
                is_closed: req.is_closed,
                version: req.version,
            },
        )
        .await?;
    tx.commit().await?;

    Ok(Json(board.into()))
}

/// Deletes a board; its tasks go to the end of Icebox
///
/// # Errors
///
/// - `404 Not Found`: No such board
/// - `412 Precondition Failed`: System boards cannot be deleted
pub async fn delete_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut tx = begin_write(&state.db).await?;
    BoardService::new(&mut tx).delete_board(&board_id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
