/// Task service

use crate::models::board::{Board, SystemBoard};
use crate::models::task::{Task, TaskMove};
use crate::models::user::User;
use crate::services::error::{ServiceError, ServiceResult};
use crate::store::{self, Condition, SortOrder, NO_LIMIT};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, info};

/// Default listing order across boards
pub const DEFAULT_TASK_ORDER: [SortOrder; 2] = [
    SortOrder {
        column: "board_id",
        descending: false,
    },
    SortOrder {
        column: "display_order",
        descending: false,
    },
];

/// Input for creating a task
///
/// A `None` board puts the task on Icebox.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub board_id: Option<String>,
    pub assignee_user_id: Option<String>,
    pub is_closed: bool,
    pub estimate_size: i64,
}

/// Editable fields of a task
///
/// Board and position are absent on purpose: they only change through
/// [`TaskService::move_task`].
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub name: String,
    pub description: String,
    pub assignee_user_id: Option<String>,
    pub is_closed: bool,
    pub estimate_size: i64,
    pub version: i64,
}

/// Task operations bound to one connection
pub struct TaskService<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> TaskService<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn find_task(&mut self, task_id: &str) -> ServiceResult<Task> {
        store::find_first(&mut *self.conn, &Condition::by_id(task_id), &[])
            .await
            .map_err(|err| match ServiceError::from(err) {
                ServiceError::NotFound(_) => ServiceError::not_found("Task", task_id),
                other => other,
            })
    }

    /// Lists every task; an empty `sort_orders` uses [`DEFAULT_TASK_ORDER`]
    pub async fn find_tasks(&mut self, sort_orders: &[SortOrder]) -> ServiceResult<Vec<Task>> {
        let sort_orders = if sort_orders.is_empty() {
            &DEFAULT_TASK_ORDER[..]
        } else {
            sort_orders
        };

        let tasks =
            store::find_many(&mut *self.conn, &Condition::all(), NO_LIMIT, NO_LIMIT, sort_orders)
                .await?;
        Ok(tasks)
    }

    /// Lists the tasks of one board by position
    pub async fn find_board_tasks(&mut self, board_id: &str) -> ServiceResult<Vec<Task>> {
        self.ensure_board(board_id).await?;

        let tasks = store::find_many(
            &mut *self.conn,
            &Condition::all().eq("board_id", board_id),
            NO_LIMIT,
            NO_LIMIT,
            &[SortOrder::asc("display_order")],
        )
        .await?;
        Ok(tasks)
    }

    /// Creates a task at the end of its board
    ///
    /// # Errors
    ///
    /// - `BadRequest` for an empty name
    /// - `NotFound` if the board or the assignee does not exist
    pub async fn create_task(&mut self, new_task: NewTask) -> ServiceResult<Task> {
        let name = new_task.name.trim();
        if name.is_empty() {
            return Err(ServiceError::BadRequest("task name must not be empty".to_string()));
        }

        let board_id = new_task
            .board_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| SystemBoard::ICEBOX.id.to_string());
        self.ensure_board(&board_id).await?;

        let assignee = new_task.assignee_user_id.filter(|id| !id.is_empty());
        if let Some(user_id) = &assignee {
            self.ensure_user(user_id).await?;
        }

        let mut task = Task::new(name, new_task.description, new_task.is_closed, Utc::now())
            .on_board(board_id)
            .assigned_to(assignee);
        task.estimate_size = new_task.estimate_size;

        Task::create(&mut *self.conn, &mut task).await?;
        Ok(task)
    }

    /// Applies `changes` to a task under the optimistic lock
    pub async fn update_task(&mut self, task_id: &str, changes: TaskChanges) -> ServiceResult<Task> {
        let name = changes.name.trim();
        if name.is_empty() {
            return Err(ServiceError::BadRequest("task name must not be empty".to_string()));
        }

        let assignee = changes.assignee_user_id.filter(|id| !id.is_empty());
        if let Some(user_id) = &assignee {
            self.ensure_user(user_id).await?;
        }

        let mut task = self.find_task(task_id).await?;
        task.name = name.to_string();
        task.description = changes.description;
        task.assignee_user_id = assignee;
        task.is_closed = changes.is_closed;
        task.estimate_size = changes.estimate_size;
        task.version = changes.version;

        store::update(&mut *self.conn, &mut task).await?;

        debug!(task_id = %task.id, version = task.version, "Task updated");
        Ok(task)
    }

    /// Deletes a task; the rest of its board keeps its positions
    pub async fn delete_task(&mut self, task_id: &str) -> ServiceResult<()> {
        let task = self.find_task(task_id).await?;
        Task::delete(&mut *self.conn, &task).await?;

        info!(task_id = %task.id, board_id = %task.board_id, "Task deleted");
        Ok(())
    }

    /// Moves a task to `to_display_order` on `to_board_id`
    ///
    /// The caller's `from` values are trusted; see [`Task::move_position`].
    ///
    /// # Errors
    ///
    /// - `BadRequest` for a position below 1
    /// - `NotFound` if either board or the task does not exist
    pub async fn move_task(&mut self, task_move: &TaskMove) -> ServiceResult<()> {
        if task_move.from_display_order < 1 || task_move.to_display_order < 1 {
            return Err(ServiceError::BadRequest(
                "display orders of tasks start at 1".to_string(),
            ));
        }

        self.ensure_board(&task_move.from_board_id).await?;
        if !task_move.is_same_board() {
            self.ensure_board(&task_move.to_board_id).await?;
        }

        Task::move_position(&mut *self.conn, task_move)
            .await
            .map_err(|err| match ServiceError::from(err) {
                ServiceError::NotFound(_) => ServiceError::not_found("Task", &task_move.task_id),
                other => other,
            })
    }

    async fn ensure_board(&mut self, board_id: &str) -> ServiceResult<()> {
        if store::count::<Board>(&mut *self.conn, &Condition::by_id(board_id)).await? == 0 {
            return Err(ServiceError::not_found("Board", board_id));
        }
        Ok(())
    }

    async fn ensure_user(&mut self, user_id: &str) -> ServiceResult<()> {
        if store::count::<User>(&mut *self.conn, &Condition::by_id(user_id)).await? == 0 {
            return Err(ServiceError::not_found("User", user_id));
        }
        Ok(())
    }
}
