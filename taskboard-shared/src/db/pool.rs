/// SQLite connection pool
///
/// The whole board lives in one SQLite file. File databases run in WAL mode
/// so readers are not blocked by the single writer; writers that collide wait
/// up to `busy_timeout_seconds` instead of failing with `SQLITE_BUSY`.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::db::pool::{create_pool, close_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), sqlx::Error> {
/// let pool = create_pool(DatabaseConfig {
///     url: "sqlite://taskboard.sqlite3?mode=rwc".to_string(),
///     ..Default::default()
/// })
/// .await?;
///
/// let boards: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM boards")
///     .fetch_one(&pool)
///     .await?;
///
/// close_pool(pool).await;
/// # Ok(())
/// # }
/// ```

use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Transaction;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Database file used when `DATABASE_URL` is not set
pub const DEFAULT_DATABASE_URL: &str = "sqlite://taskboard.sqlite3?mode=rwc";

const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Pool settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,

    /// Upper bound on open connections (default 5)
    pub max_connections: u32,

    /// Seconds to wait for a free connection (default 30)
    pub acquire_timeout_seconds: u64,

    /// Seconds a writer waits on a locked database (default 5)
    pub busy_timeout_seconds: u64,

    /// Idle connections are closed after this many seconds; `None` keeps them
    pub idle_timeout_seconds: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 5,
            acquire_timeout_seconds: 30,
            busy_timeout_seconds: 5,
            idle_timeout_seconds: Some(600),
        }
    }
}

impl DatabaseConfig {
    /// Private in-memory database
    ///
    /// An in-memory database dies with its connection, so the pool keeps
    /// exactly one connection open for its whole life.
    pub fn in_memory() -> Self {
        Self {
            url: IN_MEMORY_URL.to_string(),
            max_connections: 1,
            idle_timeout_seconds: None,
            ..Default::default()
        }
    }

    /// True for `sqlite::memory:` style URLs
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Opens the pool and checks that the database answers
///
/// # Errors
///
/// Fails when the URL is malformed, the file cannot be opened or created,
/// or the first query does not succeed.
pub async fn create_pool(config: DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = config.is_in_memory();
    info!(
        url = %config.url,
        max_connections = config.max_connections,
        in_memory,
        "Opening database"
    );

    let mut connect_options = SqliteConnectOptions::from_str(&config.url)?
        .busy_timeout(Duration::from_secs(config.busy_timeout_seconds));
    if !in_memory {
        connect_options = connect_options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
    }

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .idle_timeout(config.idle_timeout_seconds.map(Duration::from_secs));

    if in_memory {
        // Recycling the connection would drop every table.
        pool_options = pool_options
            .min_connections(1)
            .max_lifetime(None)
            .test_before_acquire(false);
    }

    let pool = pool_options.connect_with(connect_options).await?;
    health_check(&pool).await?;

    info!("Database ready");
    Ok(pool)
}

/// Opens a transaction that already holds the database write lock
///
/// `pool.begin()` issues a deferred `BEGIN`: the first read takes a snapshot
/// and a later write must upgrade it, which SQLite refuses with
/// `SQLITE_BUSY` straight away when another writer got there first,
/// ignoring the busy timeout. Writing before anything is read takes the
/// same path as `BEGIN IMMEDIATE`, so competing writers wait their turn.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    // Matches no row, but still acquires the write lock
    sqlx::query("UPDATE boards SET version = version WHERE 0")
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}

/// Runs `SELECT 1` against the pool
pub async fn health_check(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let answer: i64 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;

    if answer != 1 {
        warn!(answer, "Database health check returned unexpected value");
        return Err(sqlx::Error::Protocol(format!(
            "health check returned {}",
            answer
        )));
    }

    debug!("Database health check passed");
    Ok(())
}

/// Connection counts reported by `/health`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub active_connections: usize,
    pub idle_connections: usize,
    pub total_connections: usize,
}

pub fn get_pool_stats(pool: &SqlitePool) -> PoolStats {
    let total = pool.size() as usize;
    let idle = pool.num_idle();

    PoolStats {
        active_connections: total.saturating_sub(idle),
        idle_connections: idle,
        total_connections: total,
    }
}

/// Closes every connection, flushing the WAL into the database file
pub async fn close_pool(pool: SqlitePool) {
    pool.close().await;
    info!("Database closed");
}
