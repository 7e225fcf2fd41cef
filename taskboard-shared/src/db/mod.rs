/// SQLite persistence
///
/// - `pool`: connection pool with health check and stats
/// - `migrations`: embedded schema migrations

pub mod migrations;
pub mod pool;
