//! Shared helpers for the integration tests
//!
//! Every test gets its own private in-memory database with the schema
//! applied, so tests can run in parallel without cleanup. Tests that need
//! real concurrent connections use a database file in a temp directory.

#![allow(dead_code)]

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use taskboard_shared::db::migrations::run_migrations;
use taskboard_shared::db::pool::{begin_write, create_pool, DatabaseConfig};
use taskboard_shared::models::board::Board;
use taskboard_shared::models::task::Task;
use taskboard_shared::services::board::BoardService;
use taskboard_shared::store::{self, Condition, SortOrder, NO_LIMIT};
use tempfile::TempDir;

/// Creates a fresh in-memory database with all migrations applied
pub async fn setup_pool() -> SqlitePool {
    let pool = create_pool(DatabaseConfig::in_memory())
        .await
        .expect("Failed to create in-memory pool");
    run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

/// Creates a fresh database that already holds the four system boards
pub async fn setup_pool_with_system_boards() -> SqlitePool {
    let pool = setup_pool().await;
    create_system_boards(&pool).await;
    pool
}

/// Creates a file-backed database with `connections` pooled connections
///
/// The database lives as long as the returned `TempDir`.
pub async fn setup_file_pool(connections: u32) -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("taskboard.sqlite3").display());

    let pool = create_pool(DatabaseConfig {
        url,
        max_connections: connections,
        ..Default::default()
    })
    .await
    .expect("Failed to create file pool");
    run_migrations(&pool).await.expect("Failed to run migrations");
    create_system_boards(&pool).await;

    (dir, pool)
}

async fn create_system_boards(pool: &SqlitePool) {
    let mut tx = begin_write(pool).await.unwrap();
    BoardService::new(&mut tx).create_system_boards().await.unwrap();
    tx.commit().await.unwrap();
}

/// Creates a user board through the position manager
pub async fn create_board(conn: &mut SqliteConnection, name: &str) -> Board {
    let mut board = Board::new(name, false, false, Utc::now());
    Board::create(conn, &mut board).await.unwrap();
    board
}

/// Creates one task per name on `board_id`, in order
pub async fn create_tasks(conn: &mut SqliteConnection, board_id: &str, names: &[&str]) -> Vec<Task> {
    let mut tasks = Vec::new();
    for name in names {
        let mut task = Task::new(*name, "", false, Utc::now()).on_board(board_id);
        Task::create(conn, &mut task).await.unwrap();
        tasks.push(task);
    }
    tasks
}

/// `(name, display_order)` of a board's tasks, by position
pub async fn task_orders(conn: &mut SqliteConnection, board_id: &str) -> Vec<(String, i64)> {
    let tasks: Vec<Task> = store::find_many(
        conn,
        &Condition::all().eq("board_id", board_id),
        NO_LIMIT,
        NO_LIMIT,
        &[SortOrder::asc("display_order")],
    )
    .await
    .unwrap();

    tasks.into_iter().map(|t| (t.name, t.display_order)).collect()
}

/// `(name, display_order)` of every board, by position
pub async fn board_orders(conn: &mut SqliteConnection) -> Vec<(String, i64)> {
    let boards: Vec<Board> = store::find_many(
        conn,
        &Condition::all(),
        NO_LIMIT,
        NO_LIMIT,
        &[SortOrder::asc("display_order")],
    )
    .await
    .unwrap();

    boards.into_iter().map(|b| (b.name, b.display_order)).collect()
}

/// Builds the expected `(name, order)` list
pub fn orders(expected: &[(&str, i64)]) -> Vec<(String, i64)> {
    expected.iter().map(|(name, order)| (name.to_string(), *order)).collect()
}
