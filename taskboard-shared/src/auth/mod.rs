/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
///
/// Login itself lives in [`crate::services::user::UserService::login`]; this
/// module only deals with the stored password hashes.

pub mod password;
