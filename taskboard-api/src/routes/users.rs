/// User endpoints and login
///
/// # Endpoints
///
/// - `POST   /taskboard/login` - Check name and password
/// - `GET    /taskboard/users` - List users by name
/// - `POST   /taskboard/users` - Create a user
/// - `GET    /taskboard/users/:userid` - Get one user
/// - `PUT    /taskboard/users/:userid` - Update (optimistic)
/// - `DELETE /taskboard/users/:userid` - Delete, unassigning their tasks
///
/// Password hashes never appear in responses.

use crate::{
    app::AppState,
    error::{validate_request, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::db::pool::begin_write;
use taskboard_shared::models::user::User;
use taskboard_shared::services::user::{NewUser, UserChanges, UserService};
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Create user request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 1024, message = "Password must be 1-1024 characters"))]
    pub password: String,

    #[serde(default)]
    #[validate(length(max = 255, message = "Avatar must be at most 255 characters"))]
    pub avatar: String,
}

/// Update user request
///
/// Omit `password` to keep the current one.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 1024, message = "Password must be 1-1024 characters"))]
    pub password: Option<String>,

    #[serde(default)]
    #[validate(length(max = 255, message = "Avatar must be at most 255 characters"))]
    pub avatar: String,

    #[validate(range(min = 1, message = "Version must be at least 1"))]
    pub version: i64,
}

/// User as returned by the API
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub version: i64,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            avatar: user.avatar,
            version: user.version,
        }
    }
}

/// Logs a user in
///
/// # Errors
///
/// - `401 Unauthorized`: "Login failed", whatever the reason
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<UserResponse>> {
    validate_request(&req)?;

    let mut conn = state.db.acquire().await?;
    let user = UserService::new(&mut conn).login(&req.name, &req.password).await?;

    Ok(Json(user.into()))
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserResponse>>> {
    let mut conn = state.db.acquire().await?;
    let users = UserService::new(&mut conn).find_users(&[]).await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let mut conn = state.db.acquire().await?;
    let user = UserService::new(&mut conn).find_user(&user_id).await?;

    Ok(Json(user.into()))
}

/// Creates a user
///
/// # Errors
///
/// - `409 Conflict`: The name is taken
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    validate_request(&req)?;

    let mut tx = begin_write(&state.db).await?;
    let user = UserService::new(&mut tx)
        .create_user(NewUser {
            name: req.name,
            password: req.password,
            avatar: req.avatar,
        })
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Updates a user
///
/// # Errors
///
/// - `404 Not Found`: No such user
/// - `409 Conflict`: The user changed since `version`, or the name is taken
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    validate_request(&req)?;

    let mut tx = begin_write(&state.db).await?;
    let user = UserService::new(&mut tx)
        .update_user(
            &user_id,
            UserChanges {
                name: req.name,
                password: req.password,
                avatar: req.avatar,
                version: req.version,
            },
        )
        .await?;
    tx.commit().await?;

    Ok(Json(user.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut tx = begin_write(&state.db).await?;
    UserService::new(&mut tx).delete_user(&user_id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
