/// Board service
///
/// Boards are created through [`Board::create`] so they are appended to the
/// global ordering. Deleting a board moves its tasks to the end of Icebox
/// first; system boards cannot be deleted at all.

use crate::models::board::{Board, SystemBoard};
use crate::models::task::Task;
use crate::services::error::{ServiceError, ServiceResult};
use crate::store::{self, Condition, SortOrder, NO_LIMIT};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

/// Default listing order: board position, then creation time
pub const DEFAULT_BOARD_ORDER: [SortOrder; 2] = [
    SortOrder {
        column: "display_order",
        descending: false,
    },
    SortOrder {
        column: "created_date",
        descending: false,
    },
];

/// Input for creating a board
#[derive(Debug, Clone, Default)]
pub struct NewBoard {
    pub name: String,
    pub is_closed: bool,
}

/// Editable fields of a board
///
/// `version` is the version the caller's copy was read at; the write is
/// rejected if the stored board has moved on since.
#[derive(Debug, Clone, Default)]
pub struct BoardChanges {
    pub name: String,
    pub is_closed: bool,
    pub version: i64,
}

/// Board operations bound to one connection
pub struct BoardService<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> BoardService<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn find_board(&mut self, board_id: &str) -> ServiceResult<Board> {
        store::find_first(&mut *self.conn, &Condition::by_id(board_id), &[])
            .await
            .map_err(|err| match ServiceError::from(err) {
                ServiceError::NotFound(_) => ServiceError::not_found("Board", board_id),
                other => other,
            })
    }

    /// Lists every board; an empty `sort_orders` uses [`DEFAULT_BOARD_ORDER`]
    pub async fn find_boards(&mut self, sort_orders: &[SortOrder]) -> ServiceResult<Vec<Board>> {
        let sort_orders = if sort_orders.is_empty() {
            &DEFAULT_BOARD_ORDER[..]
        } else {
            sort_orders
        };

        let boards =
            store::find_many(&mut *self.conn, &Condition::all(), NO_LIMIT, NO_LIMIT, sort_orders)
                .await?;
        Ok(boards)
    }

    /// Creates a user board at the end of the ordering
    pub async fn create_board(&mut self, new_board: NewBoard) -> ServiceResult<Board> {
        let name = new_board.name.trim();
        if name.is_empty() {
            return Err(ServiceError::BadRequest("board name must not be empty".to_string()));
        }

        let mut board = Board::new(name, false, new_board.is_closed, Utc::now());
        Board::create(&mut *self.conn, &mut board).await?;
        Ok(board)
    }

    /// Applies `changes` to a board under the optimistic lock
    ///
    /// Position and system flag are not editable here.
    pub async fn update_board(&mut self, board_id: &str, changes: BoardChanges) -> ServiceResult<Board> {
        let name = changes.name.trim();
        if name.is_empty() {
            return Err(ServiceError::BadRequest("board name must not be empty".to_string()));
        }

        let mut board = self.find_board(board_id).await?;
        board.name = name.to_string();
        board.is_closed = changes.is_closed;
        board.version = changes.version;

        store::update(&mut *self.conn, &mut board).await?;

        debug!(board_id = %board.id, version = board.version, "Board updated");
        Ok(board)
    }

    /// Deletes a board after moving its tasks to the end of Icebox
    ///
    /// # Errors
    ///
    /// - `NotFound` if the board does not exist
    /// - `PreconditionInvalid` for a system board
    pub async fn delete_board(&mut self, board_id: &str) -> ServiceResult<()> {
        let board = self.find_board(board_id).await?;
        if board.is_system || SystemBoard::is_reserved_id(&board.id) {
            warn!(board_id = %board.id, "Refusing to delete system board");
            return Err(ServiceError::PreconditionInvalid(format!(
                "system board {} cannot be deleted",
                board.name
            )));
        }

        let moved = Task::move_to_default_board(&mut *self.conn, &board.id).await?;
        Board::delete(&mut *self.conn, &board).await?;

        info!(board_id = %board.id, moved_tasks = moved, "Board deleted");
        Ok(())
    }

    /// Sets each listed board's position to its index in `board_ids`
    ///
    /// # Errors
    ///
    /// - `BadRequest` if an id is listed twice
    /// - `NotFound` if an id names no board
    pub async fn reorder_boards(&mut self, board_ids: &[String]) -> ServiceResult<()> {
        for (index, board_id) in board_ids.iter().enumerate() {
            if board_ids[..index].contains(board_id) {
                return Err(ServiceError::BadRequest(format!(
                    "board {} listed more than once",
                    board_id
                )));
            }
            let exists = store::count::<Board>(&mut *self.conn, &Condition::by_id(board_id)).await?;
            if exists == 0 {
                return Err(ServiceError::not_found("Board", board_id));
            }
        }

        Board::reorder(&mut *self.conn, board_ids).await?;
        Ok(())
    }

    /// Creates each missing system board, in Icebox, Todo, Doing, Done order
    ///
    /// A board is considered present when a system board with its reserved id
    /// exists. Returns how many boards were created, so a second run yields 0.
    pub async fn create_system_boards(&mut self) -> ServiceResult<usize> {
        let mut created = 0;

        for system_board in SystemBoard::ALL {
            let condition = Condition::by_id(system_board.id).eq("is_system", true);
            if store::count::<Board>(&mut *self.conn, &condition).await? > 0 {
                debug!(board_id = system_board.id, "System board already present");
                continue;
            }

            let mut board = system_board.to_board(Utc::now());
            Board::create(&mut *self.conn, &mut board).await?;
            created += 1;
        }

        if created > 0 {
            info!(created, "System boards created");
        }
        Ok(created)
    }
}
