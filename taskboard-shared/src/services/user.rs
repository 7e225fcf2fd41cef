/// User service
///
/// Login looks a user up by name and checks the password hash. Every failure
/// mode (unknown name, wrong password, unreadable hash) surfaces as the same
/// [`ServiceError::Unauthenticated`].

use crate::models::task::Task;
use crate::models::user::User;
use crate::services::error::{ServiceError, ServiceResult};
use crate::store::{self, Condition, SortOrder, StoreError, NO_LIMIT};
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

/// Input for creating a user
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub password: String,
    pub avatar: String,
}

/// Editable fields of a user
///
/// A `None` password keeps the current one.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: String,
    pub password: Option<String>,
    pub avatar: String,
    pub version: i64,
}

/// User operations bound to one connection
pub struct UserService<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> UserService<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn find_user(&mut self, user_id: &str) -> ServiceResult<User> {
        store::find_first(&mut *self.conn, &Condition::by_id(user_id), &[])
            .await
            .map_err(|err| match ServiceError::from(err) {
                ServiceError::NotFound(_) => ServiceError::not_found("User", user_id),
                other => other,
            })
    }

    /// Lists every user; an empty `sort_orders` sorts by name
    pub async fn find_users(&mut self, sort_orders: &[SortOrder]) -> ServiceResult<Vec<User>> {
        let by_name = [SortOrder::asc("name")];
        let sort_orders = if sort_orders.is_empty() {
            &by_name[..]
        } else {
            sort_orders
        };

        let users =
            store::find_many(&mut *self.conn, &Condition::all(), NO_LIMIT, NO_LIMIT, sort_orders)
                .await?;
        Ok(users)
    }

    pub async fn create_user(&mut self, new_user: NewUser) -> ServiceResult<User> {
        let name = new_user.name.trim();
        if name.is_empty() || new_user.password.is_empty() {
            return Err(ServiceError::BadRequest(
                "user name and password are required".to_string(),
            ));
        }

        let mut user = User::new(name, &new_user.password, new_user.avatar)?;
        store::create(&mut *self.conn, &mut user).await?;

        info!(user_id = %user.id, name = %user.name, "User created");
        Ok(user)
    }

    /// Applies `changes` to a user under the optimistic lock
    pub async fn update_user(&mut self, user_id: &str, changes: UserChanges) -> ServiceResult<User> {
        let name = changes.name.trim();
        if name.is_empty() {
            return Err(ServiceError::BadRequest("user name must not be empty".to_string()));
        }

        let mut user = self.find_user(user_id).await?;
        user.name = name.to_string();
        user.avatar = changes.avatar;
        if let Some(password) = changes.password.filter(|p| !p.is_empty()) {
            user.set_password(&password)?;
        }
        user.version = changes.version;

        store::update(&mut *self.conn, &mut user).await?;

        debug!(user_id = %user.id, version = user.version, "User updated");
        Ok(user)
    }

    /// Deletes a user and clears it from the tasks assigned to it
    pub async fn delete_user(&mut self, user_id: &str) -> ServiceResult<()> {
        let user = self.find_user(user_id).await?;

        let unassigned = Task::unassign_user(&mut *self.conn, &user.id).await?;
        store::delete(&mut *self.conn, &user).await?;

        info!(user_id = %user.id, unassigned_tasks = unassigned, "User deleted");
        Ok(())
    }

    /// Checks a name/password pair and returns the matching user
    ///
    /// The name is trimmed the same way as on create and update.
    pub async fn login(&mut self, name: &str, password: &str) -> ServiceResult<User> {
        let condition = Condition::all().eq("name", name.trim());
        let user: User = match store::find_first(&mut *self.conn, &condition, &[]).await {
            Ok(user) => user,
            Err(StoreError::NotFound { .. }) => {
                warn!("Login failed: unknown user name");
                return Err(ServiceError::Unauthenticated);
            }
            Err(err) => return Err(err.into()),
        };

        match user.verify_password(password) {
            Ok(true) => {
                info!(user_id = %user.id, "User logged in");
                Ok(user)
            }
            Ok(false) => {
                warn!(user_id = %user.id, "Login failed: wrong password");
                Err(ServiceError::Unauthenticated)
            }
            Err(err) => {
                warn!(user_id = %user.id, error = %err, "Login failed: stored hash unusable");
                Err(ServiceError::Unauthenticated)
            }
        }
    }
}
