/// Session lifecycle endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a new account
/// - `POST /api/auth/login` - Verify credentials and open a session
/// - `POST /api/auth/refresh` - Exchange the refresh cookie for a new
///   access token
/// - `POST /api/auth/logout` - Clear the refresh cookie
///
/// # Token delivery
///
/// The access token is returned in the JSON body and presented back as a
/// bearer header. The refresh token is never in a body; it travels only in
/// an HTTP-only, SameSite=Strict cookie scoped to the refresh lifetime,
/// marked Secure outside development.
///
/// Logout is stateless: it clears the cookie and nothing else. A refresh
/// token that leaked before logout remains cryptographically valid until
/// its signed expiry; there is no server-side revocation list.

use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, User, UserRole, UserSummary},
};
use validator::Validate;

/// Name of the refresh-token cookie
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Username must be 1-100 characters"))]
    pub username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,

    /// Optional role; defaults to `user`
    pub role: Option<UserRole>,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserSummary,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login / refresh response
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Bearer token for subsequent requests
    pub access_token: String,

    pub user: UserSummary,
}

/// Logout response
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Register a new account
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// { "username": "jane", "email": "jane@example.com", "password": "pw123456" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing fields or validation failure
/// - `409 Conflict`: email already registered. The pre-insert existence
///   check gives the friendly error; the unique index catches the race
///   where two registrations pass that check together.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
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
            role: req.role.unwrap_or_default(),
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: user.summary(),
        }),
    ))
}

/// Verify credentials and open a session
///
/// Issues one access token (body) and one refresh token (cookie), both
/// bound to the user's id and role.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// { "email": "jane@example.com", "password": "pw123456" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing fields
/// - `401 Unauthorized`: unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<SessionResponse>)> {
    let (email, plaintext) = match (req.email, req.password) {
        (Some(e), Some(p)) => (e, p),
        _ => return Err(ApiError::BadRequest("All fields are required".to_string())),
    };

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User does not exist".to_string()))?;

    let valid = password::verify_password(&plaintext, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let access_token = jwt::issue(&state.jwt, jwt::TokenKind::Access, user.id, user.role)?;
    let refresh_token = jwt::issue(&state.jwt, jwt::TokenKind::Refresh, user.id, user.role)?;

    let jar = jar.add(refresh_cookie(&state, refresh_token));

    Ok((
        jar,
        Json(SessionResponse {
            access_token,
            user: user.summary(),
        }),
    ))
}

/// Exchange the refresh cookie for a new access token
///
/// Re-resolves the user record, so a deleted account cannot keep minting
/// access tokens from an old refresh token. The refresh token itself is
/// not rotated; it lives out its original expiry.
///
/// # Errors
///
/// - `401 Unauthorized`: cookie missing, or token invalid/expired
/// - `404 Not Found`: the account no longer exists
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Json<SessionResponse>> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| ApiError::Unauthorized("No refresh token provided".to_string()))?;

    let claims = jwt::verify(&state.jwt, jwt::TokenKind::Refresh, &token)
        .map_err(|_| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let access_token = jwt::issue(&state.jwt, jwt::TokenKind::Access, user.id, user.role)?;

    Ok(Json(SessionResponse {
        access_token,
        user: user.summary(),
    }))
}

/// Clear the refresh cookie
///
/// Works with or without a live session; clearing an absent cookie is a
/// no-op.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<LogoutResponse>)> {
    let mut removal = Cookie::build((REFRESH_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(0))
        .build();
    removal.set_secure(state.config.api.production);

    let jar = jar.add(removal);

    Ok((
        jar,
        Json(LogoutResponse {
            message: "Logout successful".to_string(),
        }),
    ))
}

/// Builds the refresh-token cookie
///
/// HTTP-only and SameSite=Strict keep it out of scripts and cross-site
/// requests; the max-age matches the token's signed expiry so the browser
/// drops the cookie when the token would stop verifying anyway.
fn refresh_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let mut cookie = Cookie::build((REFRESH_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(state.config.jwt.refresh_ttl_secs))
        .build();
    cookie.set_secure(state.config.api.production);
    cookie
}
