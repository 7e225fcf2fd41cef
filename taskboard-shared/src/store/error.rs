/// Errors raised by the record store and the position managers

/// Error type for record store operations
///
/// The store never retries: every failure is returned to the caller, which is
/// expected to roll back the enclosing transaction.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record matched the lookup condition
    #[error("No {table} record matched the condition")]
    NotFound {
        /// Table that was searched
        table: &'static str,
    },

    /// The conditional write matched no row
    ///
    /// Either the record was modified concurrently (its version moved on) or it
    /// no longer exists. The two cases are deliberately not distinguished.
    #[error("Optimistic lock failure on {table} record {id} (expected version {expected_version})")]
    OptimisticLockFailure {
        /// Table of the record
        table: &'static str,

        /// Id of the record
        id: String,

        /// Version the caller's copy was based on
        expected_version: i64,
    },

    /// A condition or sort order named a column the table does not have
    #[error("Unknown column `{column}` for table {table}")]
    UnknownColumn {
        /// Table of the record
        table: &'static str,

        /// Offending column name
        column: String,
    },

    /// Any other persistence failure, including constraint violations
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// True when the database rejected the write because of a unique or
    /// foreign key constraint
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::Database(db_err)) => {
                db_err.is_unique_violation() || db_err.is_foreign_key_violation()
            }
            _ => false,
        }
    }

    /// True for a lookup miss
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. } | StoreError::Database(sqlx::Error::RowNotFound)
        )
    }
}
