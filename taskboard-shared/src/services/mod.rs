/// Domain services
///
/// Each service borrows one connection (usually a transaction) for its
/// lifetime and orchestrates the store and position managers on it. Services
/// never commit: the caller owns the transaction and drops it on error, which
/// rolls back any partially applied multi-row sequence.
///
/// # Services
///
/// - [`board::BoardService`]: board CRUD, reordering, cascading delete and
///   system board bootstrap
/// - [`task::TaskService`]: task CRUD and moves
/// - [`user::UserService`]: user CRUD and login
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::db::pool::begin_write;
/// use taskboard_shared::services::board::BoardService;
/// use sqlx::SqlitePool;
///
/// # async fn example(pool: SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
/// let mut tx = begin_write(&pool).await?;
///
/// let created = BoardService::new(&mut tx).create_system_boards().await?;
/// tracing::info!(created, "System boards ready");
///
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

pub mod board;
pub mod error;
pub mod task;
pub mod user;

pub use error::{ServiceError, ServiceResult};
