/// User model
///
/// Users are the people tasks get assigned to. Each one carries an Argon2id
/// password hash used by login; the raw password is never stored and the hash
/// is never serialized.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id            VARCHAR(32)  PRIMARY KEY NOT NULL,
///     name          VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     avatar        VARCHAR(255) NOT NULL DEFAULT '',
///     version       INTEGER      NOT NULL
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::User;
/// use taskboard_shared::store;
/// use sqlx::SqlitePool;
///
/// # async fn example(pool: SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
/// let mut user = User::new("alice", "correct horse", "alice.png")?;
///
/// let mut conn = pool.acquire().await?;
/// store::create(&mut conn, &mut user).await?;
/// assert!(user.verify_password("correct horse")?);
/// # Ok(())
/// # }
/// ```

use crate::auth::password::{hash_password, verify_password, PasswordError};
use crate::id::generate_id;
use crate::store::{Record, Value};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

static USER_LOCK: Mutex<()> = Mutex::const_new(());

/// User model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: String,

    /// Login name, unique across users
    pub name: String,

    /// Argon2id password hash (PHC string)
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Avatar reference (file name or URL), may be empty
    pub avatar: String,

    /// Optimistic lock version (starts at 1)
    pub version: i64,
}

impl Record for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &["id", "name", "password_hash", "avatar", "version"];

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.clone().into(),
            self.name.clone().into(),
            self.password_hash.clone().into(),
            self.avatar.clone().into(),
            self.version.into(),
        ]
    }

    fn entity_lock() -> &'static Mutex<()> {
        &USER_LOCK
    }
}

impl User {
    /// Builds a new user, hashing `raw_password`
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::HashError` if hashing fails
    pub fn new(
        name: impl Into<String>,
        raw_password: &str,
        avatar: impl Into<String>,
    ) -> Result<Self, PasswordError> {
        Ok(Self {
            id: generate_id(),
            name: name.into(),
            password_hash: hash_password(raw_password)?,
            avatar: avatar.into(),
            version: 1,
        })
    }

    /// Replaces the stored hash with a hash of `raw_password`
    pub fn set_password(&mut self, raw_password: &str) -> Result<(), PasswordError> {
        self.password_hash = hash_password(raw_password)?;
        Ok(())
    }

    /// Checks `raw_password` against the stored hash
    pub fn verify_password(&self, raw_password: &str) -> Result<bool, PasswordError> {
        verify_password(raw_password, &self.password_hash)
    }
}
