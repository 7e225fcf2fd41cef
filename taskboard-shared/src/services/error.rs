/// Errors surfaced by the domain services

use crate::auth::password::PasswordError;
use crate::store::StoreError;

/// Error type for domain service operations
///
/// Store failures are re-tagged, never swallowed: a lookup miss becomes
/// [`ServiceError::NotFound`], a version conflict stays a conflict, and
/// everything else is wrapped as [`ServiceError::Storage`].
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The requested entity does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// The entity was modified concurrently; the caller must reload and retry
    #[error("{0}")]
    OptimisticLockFailure(String),

    /// Any other persistence failure
    #[error("Storage error: {0}")]
    Storage(#[source] StoreError),

    /// Login failed
    ///
    /// Deliberately carries no detail about which check failed.
    #[error("Login failed")]
    Unauthenticated,

    /// Malformed input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The entity is in a state that forbids the operation
    #[error("Precondition failed: {0}")]
    PreconditionInvalid(String),

    /// Password hashing failed
    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl ServiceError {
    /// Builds a `NotFound` for an entity kind and id
    pub fn not_found(entity: &str, id: &str) -> Self {
        ServiceError::NotFound(format!("{} {}", entity, id))
    }

    /// True when the underlying store rejected a write on a unique or foreign
    /// key constraint
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, ServiceError::Storage(err) if err.is_constraint_violation())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { table } => ServiceError::NotFound(format!("{} record", table)),
            err if err.is_not_found() => ServiceError::NotFound("record".to_string()),
            err @ StoreError::OptimisticLockFailure { .. } => {
                ServiceError::OptimisticLockFailure(err.to_string())
            }
            err => ServiceError::Storage(err),
        }
    }
}

/// Result alias used by the services
pub type ServiceResult<T> = Result<T, ServiceError>;
