/// Generic record store with optimistic locking
///
/// Every persisted type implements [`Record`]: it names its table and columns,
/// exposes its id and version, and renders its column values. The functions in
/// this module then provide create/find/count/update/delete for any record.
///
/// # Optimistic Locking
///
/// [`update`] never reads before writing. It bumps the in-memory version and
/// issues a single conditional write:
///
/// ```text
/// UPDATE <table> SET ..., version = old + 1 WHERE id = ? AND version = old
/// ```
///
/// Zero affected rows means the caller's copy is stale (or the row is gone) and
/// yields [`StoreError::OptimisticLockFailure`]. Nothing is retried.
///
/// # Entity Locks
///
/// Each record type owns a process-wide `tokio::sync::Mutex<()>`. The store
/// holds it while updating; the position managers hold it around their
/// multi-statement sequences (count-then-insert, bulk shifts). These locks only
/// serialize work inside one process. Across processes the conditional write
/// is the sole guard.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::db::pool::begin_write;
/// use taskboard_shared::models::board::Board;
/// use taskboard_shared::store::{self, Condition, SortOrder};
/// use sqlx::SqlitePool;
///
/// # async fn example(pool: SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
/// let mut tx = begin_write(&pool).await?;
///
/// let mut board: Board = store::find_first(
///     &mut tx,
///     &Condition::all().eq("name", "Todo"),
///     &[SortOrder::asc("id")],
/// )
/// .await?;
///
/// board.is_closed = true;
/// store::update(&mut tx, &mut board).await?;
///
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

mod error;

pub use error::StoreError;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{Sqlite, SqliteConnection, SqliteRow};
use sqlx::{FromRow, QueryBuilder};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Offset/limit value meaning "unbounded"
pub const NO_LIMIT: i64 = -1;

/// A persisted record carrying an optimistic-lock version
pub trait Record: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    /// Table name
    const TABLE: &'static str;

    /// Column names in the order [`Record::values`] renders them
    ///
    /// Must contain `id` and `version`.
    const COLUMNS: &'static [&'static str];

    /// Primary key
    fn id(&self) -> &str;

    /// Current optimistic-lock version
    fn version(&self) -> i64;

    /// Overwrites the optimistic-lock version
    fn set_version(&mut self, version: i64);

    /// Column values in [`Record::COLUMNS`] order
    fn values(&self) -> Vec<Value>;

    /// Process-wide lock serializing structural writes of this record type
    fn entity_lock() -> &'static Mutex<()>;
}

/// A column value bound into a statement
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Null,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Text(value.clone())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Equality filter over named columns, joined with `AND`
///
/// An empty condition matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    clauses: Vec<(&'static str, Value)>,
}

impl Condition {
    /// Condition matching every row
    pub fn all() -> Self {
        Self::default()
    }

    /// Condition matching the record with the given id
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::all().eq("id", id.into())
    }

    /// Adds `column = value`
    pub fn eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.clauses.push((column, value.into()));
        self
    }

    /// True when the condition matches every row
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.clauses.iter().map(|(column, _)| *column)
    }

    /// Appends ` WHERE ...` (nothing for an empty condition)
    pub(crate) fn push_where(&self, builder: &mut QueryBuilder<'static, Sqlite>) {
        for (index, (column, value)) in self.clauses.iter().enumerate() {
            builder.push(if index == 0 { " WHERE " } else { " AND " });
            builder.push(column);
            match value {
                Value::Null => {
                    builder.push(" IS NULL");
                }
                value => {
                    builder.push(" = ");
                    push_value(builder, value.clone());
                }
            }
        }
    }
}

/// One `ORDER BY` term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub column: &'static str,
    pub descending: bool,
}

impl SortOrder {
    pub fn asc(column: &'static str) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub fn desc(column: &'static str) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

fn push_value(builder: &mut QueryBuilder<'static, Sqlite>, value: Value) {
    match value {
        Value::Text(v) => builder.push_bind(v),
        Value::Integer(v) => builder.push_bind(v),
        Value::Bool(v) => builder.push_bind(v),
        Value::Timestamp(v) => builder.push_bind(v),
        Value::Null => builder.push_bind(Option::<String>::None),
    };
}

fn check_columns<T: Record>(
    columns: impl IntoIterator<Item = &'static str>,
) -> Result<(), StoreError> {
    for column in columns {
        if !T::COLUMNS.contains(&column) {
            return Err(StoreError::UnknownColumn {
                table: T::TABLE,
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Checks that every column of the condition exists on `T`
pub(crate) fn check_condition<T: Record>(condition: &Condition) -> Result<(), StoreError> {
    check_columns::<T>(condition.columns())
}

fn select_query<T: Record>(
    condition: &Condition,
    offset: i64,
    limit: i64,
    sort_orders: &[SortOrder],
) -> Result<QueryBuilder<'static, Sqlite>, StoreError> {
    check_condition::<T>(condition)?;
    check_columns::<T>(sort_orders.iter().map(|order| order.column))?;

    let mut builder = QueryBuilder::new(format!(
        "SELECT {} FROM {}",
        T::COLUMNS.join(", "),
        T::TABLE
    ));
    condition.push_where(&mut builder);

    for (index, order) in sort_orders.iter().enumerate() {
        builder.push(if index == 0 { " ORDER BY " } else { ", " });
        builder.push(order.column);
        builder.push(if order.descending { " DESC" } else { " ASC" });
    }

    // SQLite only accepts OFFSET after LIMIT; a negative LIMIT means unbounded.
    if limit >= 0 || offset >= 0 {
        builder.push(" LIMIT ");
        builder.push_bind(if limit >= 0 { limit } else { NO_LIMIT });
    }
    if offset >= 0 {
        builder.push(" OFFSET ");
        builder.push_bind(offset);
    }

    Ok(builder)
}

/// Inserts a new record with `version = 1`
///
/// # Errors
///
/// Returns `StoreError::Database` on constraint violations (e.g. a duplicate
/// unique name) or any other database failure.
pub async fn create<T: Record>(
    conn: &mut SqliteConnection,
    record: &mut T,
) -> Result<(), StoreError> {
    record.set_version(1);

    let mut builder: QueryBuilder<'static, Sqlite> = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) VALUES (",
        T::TABLE,
        T::COLUMNS.join(", ")
    ));
    for (index, value) in record.values().into_iter().enumerate() {
        if index > 0 {
            builder.push(", ");
        }
        push_value(&mut builder, value);
    }
    builder.push(")");

    builder.build().execute(&mut *conn).await?;

    debug!(table = T::TABLE, id = record.id(), "Record created");
    Ok(())
}

/// Returns the first record matching `condition` in `sort_orders` order
///
/// # Errors
///
/// Returns `StoreError::NotFound` when nothing matches.
pub async fn find_first<T: Record>(
    conn: &mut SqliteConnection,
    condition: &Condition,
    sort_orders: &[SortOrder],
) -> Result<T, StoreError> {
    let mut builder = select_query::<T>(condition, NO_LIMIT, 1, sort_orders)?;

    builder
        .build_query_as::<T>()
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(StoreError::NotFound { table: T::TABLE })
}

/// Returns one page of records matching `condition`
///
/// A negative `offset` or `limit` leaves that side of the page unbounded.
pub async fn find_many<T: Record>(
    conn: &mut SqliteConnection,
    condition: &Condition,
    offset: i64,
    limit: i64,
    sort_orders: &[SortOrder],
) -> Result<Vec<T>, StoreError> {
    let mut builder = select_query::<T>(condition, offset, limit, sort_orders)?;

    let records = builder.build_query_as::<T>().fetch_all(&mut *conn).await?;
    Ok(records)
}

/// Counts records matching `condition`
pub async fn count<T: Record>(
    conn: &mut SqliteConnection,
    condition: &Condition,
) -> Result<i64, StoreError> {
    check_condition::<T>(condition)?;

    let mut builder: QueryBuilder<'static, Sqlite> =
        QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", T::TABLE));
    condition.push_where(&mut builder);

    let count: i64 = builder.build_query_scalar().fetch_one(&mut *conn).await?;
    Ok(count)
}

/// Writes `record` back if nobody changed it since it was read
///
/// Increments the in-memory version, then performs one conditional write keyed
/// on id and the previous version. On failure the in-memory version is put back.
///
/// # Errors
///
/// Returns `StoreError::OptimisticLockFailure` when the version no longer
/// matches or the record does not exist.
pub async fn update<T: Record>(
    conn: &mut SqliteConnection,
    record: &mut T,
) -> Result<(), StoreError> {
    let _guard = T::entity_lock().lock().await;
    update_locked(conn, record).await
}

/// Updates several records of one type under a single lock acquisition
///
/// Stops at the first failure; the records already written stay written until
/// the caller rolls back the transaction.
pub async fn update_all<T: Record>(
    conn: &mut SqliteConnection,
    records: &mut [T],
) -> Result<(), StoreError> {
    let _guard = T::entity_lock().lock().await;
    for record in records.iter_mut() {
        update_locked(conn, record).await?;
    }
    Ok(())
}

async fn update_locked<T: Record>(
    conn: &mut SqliteConnection,
    record: &mut T,
) -> Result<(), StoreError> {
    let old_version = record.version();
    record.set_version(old_version + 1);

    let mut builder: QueryBuilder<'static, Sqlite> =
        QueryBuilder::new(format!("UPDATE {} SET ", T::TABLE));
    let mut first = true;
    for (column, value) in T::COLUMNS.iter().zip(record.values()) {
        if *column == "id" {
            continue;
        }
        if !first {
            builder.push(", ");
        }
        first = false;
        builder.push(column);
        builder.push(" = ");
        push_value(&mut builder, value);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(record.id().to_string());
    builder.push(" AND version = ");
    builder.push_bind(old_version);

    match builder.build().execute(&mut *conn).await {
        Ok(done) if done.rows_affected() == 0 => {
            record.set_version(old_version);
            warn!(
                table = T::TABLE,
                id = record.id(),
                expected_version = old_version,
                "Optimistic lock failure"
            );
            Err(StoreError::OptimisticLockFailure {
                table: T::TABLE,
                id: record.id().to_string(),
                expected_version: old_version,
            })
        }
        Ok(_) => {
            debug!(table = T::TABLE, id = record.id(), version = old_version + 1, "Record updated");
            Ok(())
        }
        Err(e) => {
            record.set_version(old_version);
            Err(e.into())
        }
    }
}

/// Deletes `record` by id
///
/// A record with an empty id is skipped: no statement is issued and the call
/// succeeds, so a default-constructed value can never match every row.
/// Returns the number of deleted rows.
pub async fn delete<T: Record>(conn: &mut SqliteConnection, record: &T) -> Result<u64, StoreError> {
    if record.id().is_empty() {
        debug!(table = T::TABLE, "Skipping delete of record without id");
        return Ok(0);
    }

    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", T::TABLE))
        .bind(record.id())
        .execute(&mut *conn)
        .await?;

    debug!(table = T::TABLE, id = record.id(), rows = result.rows_affected(), "Record deleted");
    Ok(result.rows_affected())
}

/// Deletes every record in `records`, skipping those without an id
pub async fn delete_all<T: Record>(
    conn: &mut SqliteConnection,
    records: &[T],
) -> Result<u64, StoreError> {
    let mut deleted = 0;
    for record in records {
        deleted += delete(conn, record).await?;
    }
    Ok(deleted)
}
