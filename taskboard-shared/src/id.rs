/// Identifier generation
///
/// Every record is keyed by an opaque string id. Ids are UUID v4 values
/// rendered as 32 lowercase hex characters, which fits the `VARCHAR(32)`
/// id columns.

use uuid::Uuid;

/// Length of every generated identifier
pub const ID_LENGTH: usize = 32;

/// Returns a new globally unique identifier
///
/// # Example
///
/// ```
/// use taskboard_shared::id::{generate_id, ID_LENGTH};
///
/// let id = generate_id();
/// assert_eq!(id.len(), ID_LENGTH);
/// ```
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
