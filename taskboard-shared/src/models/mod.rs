/// Persisted models of the task board
///
/// # Models
///
/// - `board`: Boards and their global ordering, including the four system boards
/// - `task`: Tasks and their per-board ordering
/// - `user`: Users with hashed passwords
///
/// All three implement [`crate::store::Record`] and go through the generic
/// store for plain CRUD. Operations that keep the orderings consistent live
/// on the models themselves (`Board::create`, `Board::reorder`, `Task::create`,
/// `Task::move_position`, `Task::move_to_default_board`).
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::db::pool::begin_write;
/// use taskboard_shared::models::board::Board;
/// use taskboard_shared::models::task::Task;
/// use sqlx::SqlitePool;
///
/// # async fn example(pool: SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
/// let mut tx = begin_write(&pool).await?;
///
/// let mut board = Board::new("Review", false, false, chrono::Utc::now());
/// Board::create(&mut tx, &mut board).await?;
///
/// let mut task = Task::new("Check PR", "", false, chrono::Utc::now()).on_board(&board.id);
/// Task::create(&mut tx, &mut task).await?;
/// assert_eq!(task.display_order, 1);
///
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

pub mod board;
pub mod task;
pub mod user;
