/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Health check endpoint
/// - `boards`: Board CRUD
/// - `tasks`: Task CRUD and per-board listing
/// - `users`: User CRUD and login
/// - `orders`: Board reordering and task moves
///
/// Reads use a plain pooled connection. Every write runs in one transaction
/// that is committed only when the whole operation succeeded; returning early
/// with an error drops the transaction, which rolls it back.

pub mod boards;
pub mod health;
pub mod orders;
pub mod tasks;
pub mod users;
