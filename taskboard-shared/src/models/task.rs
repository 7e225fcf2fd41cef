/// Task model and task position manager
///
/// Tasks are ordered per board: within one board their `display_order` values
/// are unique and dense starting at 1. There is no ordering across boards.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id               VARCHAR(32)   PRIMARY KEY NOT NULL,
///     name             VARCHAR(255)  NOT NULL,
///     description      VARCHAR(8000) NOT NULL DEFAULT '',
///     assignee_user_id VARCHAR(32),
///     board_id         VARCHAR(32)   NOT NULL,
///     display_order    INTEGER       NOT NULL,
///     created_date     TIMESTAMP     NOT NULL,
///     is_closed        BOOLEAN       NOT NULL DEFAULT FALSE,
///     version          INTEGER       NOT NULL,
///     estimate_size    INTEGER       NOT NULL DEFAULT 0
/// );
/// ```
///
/// # Moving Tasks
///
/// ```text
/// same board, 1 -> 3:   a1 b2 c3 d4  =>  b1 c2 a3 d4
/// same board, 3 -> 1:   a1 b2 c3 d4  =>  c1 a2 b3 d4
/// cross board, X2 -> Y1:
///     X: a1 b2 c3    =>  a1 c2
///     Y: x1 y2       =>  b1 x2 y3
/// ```
///
/// The shifts are unconditional bulk writes, not optimistic updates, and the
/// moved task's version is left alone. The caller's `from`/`to` orders are
/// trusted as given: stale values misorder silently.

use crate::id::generate_id;
use crate::models::board::SystemBoard;
use crate::store::{self, Condition, Record, StoreError, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::Sqlite;
use sqlx::{QueryBuilder, SqliteConnection};
use tokio::sync::Mutex;
use tracing::{debug, info};

static TASK_LOCK: Mutex<()> = Mutex::const_new(());

/// Task model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: String,

    pub name: String,

    pub description: String,

    /// User the task is assigned to, if any
    pub assignee_user_id: Option<String>,

    /// Board holding the task (Icebox unless chosen otherwise)
    pub board_id: String,

    /// Position within the board (1-based)
    pub display_order: i64,

    pub created_date: DateTime<Utc>,

    pub is_closed: bool,

    /// Optimistic lock version (starts at 1)
    pub version: i64,

    pub estimate_size: i64,
}

/// A request to move one task to a new position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMove {
    pub task_id: String,
    pub from_board_id: String,
    pub from_display_order: i64,
    pub to_board_id: String,
    pub to_display_order: i64,
}

impl TaskMove {
    /// True when source and destination are the same board
    pub fn is_same_board(&self) -> bool {
        self.from_board_id == self.to_board_id
    }
}

impl Record for Task {
    const TABLE: &'static str = "tasks";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "assignee_user_id",
        "board_id",
        "display_order",
        "created_date",
        "is_closed",
        "version",
        "estimate_size",
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
            self.description.clone().into(),
            self.assignee_user_id.clone().into(),
            self.board_id.clone().into(),
            self.display_order.into(),
            self.created_date.into(),
            self.is_closed.into(),
            self.version.into(),
            self.estimate_size.into(),
        ]
    }

    fn entity_lock() -> &'static Mutex<()> {
        &TASK_LOCK
    }
}

impl Task {
    /// Builds a new unassigned task on the Icebox board
    ///
    /// The display order is assigned by [`Task::create`].
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        is_closed: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            description: description.into(),
            assignee_user_id: None,
            board_id: SystemBoard::ICEBOX.id.to_string(),
            display_order: 0,
            created_date: now,
            is_closed,
            version: 1,
            estimate_size: 0,
        }
    }

    /// Places the task on `board_id`; an empty id keeps the current board
    pub fn on_board(mut self, board_id: impl Into<String>) -> Self {
        let board_id = board_id.into();
        if !board_id.is_empty() {
            self.board_id = board_id;
        }
        self
    }

    /// Assigns the task; `None` or an empty id leaves it unassigned
    pub fn assigned_to(mut self, user_id: Option<String>) -> Self {
        self.assignee_user_id = user_id.filter(|id| !id.is_empty());
        self
    }

    /// Highest `display_order` among tasks matching `condition`, or 0
    pub async fn max_display_order(
        conn: &mut SqliteConnection,
        condition: &Condition,
    ) -> Result<i64, StoreError> {
        store::check_condition::<Task>(condition)?;

        let mut builder: QueryBuilder<'static, Sqlite> =
            QueryBuilder::new("SELECT MAX(display_order) FROM tasks");
        condition.push_where(&mut builder);

        let max: Option<i64> = builder.build_query_scalar().fetch_one(&mut *conn).await?;
        Ok(max.unwrap_or(0))
    }

    /// Appends a task to the end of its board and inserts it
    ///
    /// Holds the task lock across max-then-insert.
    pub async fn create(conn: &mut SqliteConnection, task: &mut Task) -> Result<(), StoreError> {
        let _guard = TASK_LOCK.lock().await;

        let max = if task.board_id.is_empty() {
            0
        } else {
            Task::max_display_order(conn, &Condition::all().eq("board_id", &task.board_id)).await?
        };
        task.display_order = max + 1;
        store::create(conn, task).await?;

        info!(
            task_id = %task.id,
            board_id = %task.board_id,
            display_order = task.display_order,
            "Task created"
        );
        Ok(())
    }

    /// Moves every task of `board_id` to the end of Icebox
    ///
    /// Orders are shifted up by Icebox's current maximum, which keeps the moved
    /// tasks in their relative order behind the existing Icebox tasks. Moving
    /// Icebox onto itself is a no-op. Returns the number of moved tasks.
    pub async fn move_to_default_board(
        conn: &mut SqliteConnection,
        board_id: &str,
    ) -> Result<u64, StoreError> {
        let icebox_id = SystemBoard::ICEBOX.id;
        if board_id == icebox_id {
            debug!("Tasks already on Icebox, nothing to move");
            return Ok(0);
        }

        let _guard = TASK_LOCK.lock().await;

        let max = Task::max_display_order(conn, &Condition::all().eq("board_id", icebox_id)).await?;

        let result = sqlx::query(
            "UPDATE tasks SET display_order = display_order + ?, board_id = ? WHERE board_id = ?",
        )
        .bind(max)
        .bind(icebox_id)
        .bind(board_id)
        .execute(&mut *conn)
        .await?;

        info!(
            from_board_id = %board_id,
            moved = result.rows_affected(),
            offset = max,
            "Tasks moved to Icebox"
        );
        Ok(result.rows_affected())
    }

    /// Moves one task to a new position, shifting its neighbours
    ///
    /// Same board, moving later (`from < to`): tasks in `(from, to]` move up
    /// one place (order - 1). Same board, moving earlier (`from > to`): tasks in
    /// `[to, from)` move down one place (order + 1). Across boards the gap on the
    /// source board is closed and a gap is opened at `to` on the destination.
    /// Finally the task itself is written at `to` on the destination board.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the task does not exist. The shifts
    /// are already applied at that point, so the caller must roll back.
    pub async fn move_position(
        conn: &mut SqliteConnection,
        task_move: &TaskMove,
    ) -> Result<(), StoreError> {
        let _guard = TASK_LOCK.lock().await;

        let from = task_move.from_display_order;
        let to = task_move.to_display_order;

        if task_move.is_same_board() {
            let board_id = &task_move.from_board_id;
            if from < to {
                sqlx::query(
                    "UPDATE tasks SET display_order = display_order - 1 \
                     WHERE board_id = ? AND display_order > ? AND display_order <= ?",
                )
                .bind(board_id)
                .bind(from)
                .bind(to)
                .execute(&mut *conn)
                .await?;
            } else if from > to {
                sqlx::query(
                    "UPDATE tasks SET display_order = display_order + 1 \
                     WHERE board_id = ? AND display_order >= ? AND display_order < ?",
                )
                .bind(board_id)
                .bind(to)
                .bind(from)
                .execute(&mut *conn)
                .await?;
            }
        } else {
            sqlx::query(
                "UPDATE tasks SET display_order = display_order - 1 \
                 WHERE board_id = ? AND display_order > ?",
            )
            .bind(&task_move.from_board_id)
            .bind(from)
            .execute(&mut *conn)
            .await?;

            sqlx::query(
                "UPDATE tasks SET display_order = display_order + 1 \
                 WHERE board_id = ? AND display_order >= ?",
            )
            .bind(&task_move.to_board_id)
            .bind(to)
            .execute(&mut *conn)
            .await?;
        }

        let result = sqlx::query("UPDATE tasks SET display_order = ?, board_id = ? WHERE id = ?")
            .bind(to)
            .bind(&task_move.to_board_id)
            .bind(&task_move.task_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { table: Task::TABLE });
        }

        debug!(
            task_id = %task_move.task_id,
            from_board_id = %task_move.from_board_id,
            from,
            to_board_id = %task_move.to_board_id,
            to,
            "Task moved"
        );
        Ok(())
    }

    /// Clears the assignee of every task assigned to `user_id`
    ///
    /// Positions and versions are not touched. Returns the number of tasks.
    pub async fn unassign_user(conn: &mut SqliteConnection, user_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE tasks SET assignee_user_id = NULL WHERE assignee_user_id = ?")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Deletes a task row; the other tasks of its board keep their orders
    pub async fn delete(conn: &mut SqliteConnection, task: &Task) -> Result<u64, StoreError> {
        store::delete(conn, task).await
    }
}
