/// User management endpoints
///
/// # Endpoints
///
/// Admin only:
/// - `GET /api/users` - List users (paginated)
/// - `POST /api/users` - Create a user
/// - `PUT /api/users/:id` - Update any user
/// - `DELETE /api/users/:id` - Delete any user
///
/// Any authenticated user:
/// - `GET /api/users/me` - Own profile
/// - `PUT /api/users/me` - Update own profile
/// - `DELETE /api/users/me` - Delete own account

use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{middleware::AuthContext, password},
    models::user::{CreateUser, UpdateUser, User, UserRole, UserSummary},
};
use uuid::Uuid;
use validator::Validate;

/// Pagination query parameters
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    /// 1-based page number (default 1)
    pub page: Option<i64>,

    /// Page size (default 10)
    pub limit: Option<i64>,
}

/// Paginated user list response
#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    pub current_page: i64,
    pub total_users: i64,
    pub total_pages: i64,
    pub users: Vec<UserSummary>,
}

/// Create user request (admin)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Username must be 1-100 characters"))]
    pub username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

/// Update user request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Username must be 1-100 characters"))]
    pub username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// Mutation acknowledgement with the affected user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: String,
    pub user: UserSummary,
}

/// Bare acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// List users with pagination (admin)
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<ListUsersResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let offset = (page - 1) * limit;

    let total = User::count(&state.db).await?;
    let users = User::list(&state.db, limit, offset).await?;

    Ok(Json(ListUsersResponse {
        current_page: page,
        total_users: total,
        total_pages: (total + limit - 1) / limit,
        users: users.iter().map(User::summary).collect(),
    }))
}

/// Create a user (admin)
///
/// Created accounts always get the `user` role; promoting an account is a
/// separate concern from creating it.
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    req.validate().map_err(validation_error)?;

    let (username, email, plaintext) = match (req.username, req.email, req.password) {
        (Some(u), Some(e), Some(p)) => (u, e, p),
        _ => return Err(ApiError::BadRequest("All fields are required".to_string())),
    };

    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let password_hash = password::hash_password(&plaintext)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username,
            email,
            password_hash,
            role: UserRole::User,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User created successfully".to_string(),
            user: user.summary(),
        }),
    ))
}

/// Update any user's username/email (admin)
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    req.validate().map_err(validation_error)?;

    let user = User::update(
        &state.db,
        id,
        UpdateUser {
            username: req.username,
            email: req.email,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse {
        message: "User updated successfully".to_string(),
        user: user.summary(),
    }))
}

/// Delete any user (admin)
///
/// Deleting an already-deleted user is 404, not an error; the operation is
/// idempotent from the caller's perspective.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let deleted = User::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}

/// Own profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<UserSummary>> {
    let user = User::find_by_id(&state.db, ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.summary()))
}

/// Update own username/email
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserSummary>> {
    req.validate().map_err(validation_error)?;

    let user = User::update(
        &state.db,
        ctx.user_id,
        UpdateUser {
            username: req.username,
            email: req.email,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.summary()))
}

/// Delete own account
pub async fn delete_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<MessageResponse>> {
    let deleted = User::delete(&state.db, ctx.user_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Account deleted successfully".to_string(),
    }))
}
