/// Board model and board position manager
///
/// Boards form one global, dense ordering: their `display_order` values are
/// `0..N-1` at rest. New boards are appended (order = current board count) and
/// a full reorder rewrites every order from a caller-supplied id sequence.
///
/// Four reserved boards (Icebox, Todo, Doing, Done) are created at startup and
/// flagged with `is_system`. Icebox is where tasks land when they have no
/// other board, including when their board is deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE boards (
///     id            VARCHAR(32)  PRIMARY KEY NOT NULL,
///     name          VARCHAR(255) NOT NULL UNIQUE,
///     display_order INTEGER      NOT NULL,
///     is_system     BOOLEAN      NOT NULL DEFAULT FALSE,
///     is_closed     BOOLEAN      NOT NULL DEFAULT FALSE,
///     created_date  TIMESTAMP    NOT NULL,
///     version       INTEGER      NOT NULL
/// );
/// ```
///
/// # Known Limitation
///
/// Deleting a board leaves a gap in the ordering. Nothing renumbers the
/// remaining boards until the next full [`Board::reorder`].

use crate::id::generate_id;
use crate::store::{self, Condition, Record, StoreError, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tokio::sync::Mutex;
use tracing::{debug, info};

static BOARD_LOCK: Mutex<()> = Mutex::const_new(());

/// Board model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Board {
    /// Unique board ID
    pub id: String,

    /// Display name, unique across boards
    pub name: String,

    /// Position among all boards (0-based)
    pub display_order: i64,

    /// Reserved workflow board, created at startup
    pub is_system: bool,

    pub is_closed: bool,

    pub created_date: DateTime<Utc>,

    /// Optimistic lock version (starts at 1)
    pub version: i64,
}

/// Definition of a reserved board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemBoard {
    pub id: &'static str,
    pub name: &'static str,

    /// Nominal position of the board
    ///
    /// Bootstrap goes through the normal append path, so the stored order is
    /// the board count at creation time and only equals this value when the
    /// system boards are created first.
    pub display_order: i64,
}

impl SystemBoard {
    pub const ICEBOX: SystemBoard = SystemBoard {
        id: "board_icebox",
        name: "Icebox",
        display_order: 0,
    };

    pub const TODO: SystemBoard = SystemBoard {
        id: "board_todo",
        name: "Todo",
        display_order: 1,
    };

    pub const DOING: SystemBoard = SystemBoard {
        id: "board_doing",
        name: "Doing",
        display_order: 2,
    };

    pub const DONE: SystemBoard = SystemBoard {
        id: "board_done",
        name: "Done",
        display_order: 3,
    };

    /// All reserved boards in bootstrap order
    pub const ALL: [SystemBoard; 4] = [
        SystemBoard::ICEBOX,
        SystemBoard::TODO,
        SystemBoard::DOING,
        SystemBoard::DONE,
    ];

    /// Builds the board record for this definition
    pub fn to_board(&self, now: DateTime<Utc>) -> Board {
        Board {
            id: self.id.to_string(),
            name: self.name.to_string(),
            display_order: self.display_order,
            is_system: true,
            is_closed: false,
            created_date: now,
            version: 1,
        }
    }

    /// True when `id` is one of the reserved board ids
    pub fn is_reserved_id(id: &str) -> bool {
        SystemBoard::ALL.iter().any(|board| board.id == id)
    }
}

impl Record for Board {
    const TABLE: &'static str = "boards";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "display_order",
        "is_system",
        "is_closed",
        "created_date",
        "version",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.clone().into(),
            self.name.clone().into(),
            self.display_order.into(),
            self.is_system.into(),
            self.is_closed.into(),
            self.created_date.into(),
            self.version.into(),
        ]
    }

    fn entity_lock() -> &'static Mutex<()> {
        &BOARD_LOCK
    }
}

impl Board {
    /// Builds a new board with a fresh id
    ///
    /// The display order is assigned by [`Board::create`].
    pub fn new(name: impl Into<String>, is_system: bool, is_closed: bool, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            display_order: 0,
            is_system,
            is_closed,
            created_date: now,
            version: 1,
        }
    }

    /// Appends a board to the global ordering and inserts it
    ///
    /// Holds the board lock so two concurrent creations cannot compute the
    /// same count.
    pub async fn create(conn: &mut SqliteConnection, board: &mut Board) -> Result<(), StoreError> {
        let _guard = BOARD_LOCK.lock().await;

        board.display_order = store::count::<Board>(conn, &Condition::all()).await?;
        store::create(conn, board).await?;

        info!(
            board_id = %board.id,
            name = %board.name,
            display_order = board.display_order,
            "Board created"
        );
        Ok(())
    }

    /// Sets every listed board's order to its index in `board_ids`
    ///
    /// Plain per-row writes without version checks: reordering is idempotent
    /// and the last writer wins. Boards missing from the list keep their
    /// current order, so callers wanting a dense result must pass every id.
    pub async fn reorder(conn: &mut SqliteConnection, board_ids: &[String]) -> Result<(), StoreError> {
        let _guard = BOARD_LOCK.lock().await;

        for (index, board_id) in board_ids.iter().enumerate() {
            sqlx::query("UPDATE boards SET display_order = ? WHERE id = ?")
                .bind(index as i64)
                .bind(board_id)
                .execute(&mut *conn)
                .await?;
        }

        debug!(boards = board_ids.len(), "Boards reordered");
        Ok(())
    }

    /// Deletes a board row
    ///
    /// Tasks on the board are not touched here, and the remaining boards are
    /// not renumbered.
    pub async fn delete(conn: &mut SqliteConnection, board: &Board) -> Result<u64, StoreError> {
        store::delete(conn, board).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_defaults() {
        let now = Utc::now();
        let board = Board::new("Backlog", false, true, now);

        assert_eq!(board.id.len(), 32);
        assert_eq!(board.name, "Backlog");
        assert!(!board.is_system);
        assert!(board.is_closed);
        assert_eq!(board.created_date, now);
        assert_eq!(board.version, 1);
    }

    #[test]
    fn test_system_boards() {
        let names: Vec<_> = SystemBoard::ALL.iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["Icebox", "Todo", "Doing", "Done"]);

        let orders: Vec<_> = SystemBoard::ALL.iter().map(|b| b.display_order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);

        for board in SystemBoard::ALL {
            assert!(board.id.len() <= 32);
            assert!(SystemBoard::is_reserved_id(board.id));
        }
        assert!(!SystemBoard::is_reserved_id("board_other"));
    }

    #[test]
    fn test_system_board_to_board() {
        let board = SystemBoard::DOING.to_board(Utc::now());
        assert_eq!(board.id, "board_doing");
        assert_eq!(board.name, "Doing");
        assert!(board.is_system);
        assert!(!board.is_closed);
        assert_eq!(board.version, 1);
    }

    #[test]
    fn test_values_follow_columns() {
        let board = Board::new("Review", false, false, Utc::now());
        let values = board.values();

        assert_eq!(values.len(), Board::COLUMNS.len());
        assert_eq!(values[0], Value::Text(board.id.clone()));
        assert_eq!(values[1], Value::Text("Review".to_string()));
        assert_eq!(values[6], Value::Integer(1));
    }
}
