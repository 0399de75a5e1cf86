/// Access-control gate for axum
///
/// Two layers compose in front of every protected route:
///
/// 1. An authentication layer (wired in the API crate with its state)
///    calls [`authenticate`] to turn the `Authorization: Bearer <token>`
///    header into an [`AuthContext`] in the request extensions.
/// 2. [`require_admin`] reads that context and rejects non-administrators
///    before the handler runs.
///
/// Role comparison is an exhaustive match on [`UserRole`], never a string
/// comparison, so an unknown role cannot pass a gate.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskboard_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(ctx): Extension<AuthContext>) -> String {
///     format!("user {} ({})", ctx.user_id, ctx.role.as_str())
/// }
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::jwt::{self, JwtConfig, JwtError, TokenKind};
use crate::models::user::UserRole;

/// Identity attached to a request after successful authentication
///
/// Handlers extract it with axum's `Extension` extractor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Role claimed by the verified token
    pub role: UserRole,
}

impl AuthContext {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Error type for the access-control gate
#[derive(Debug)]
pub enum AuthError {
    /// Missing or non-Bearer authorization header
    MissingCredentials,

    /// Token failed verification (bad signature, malformed, expired)
    InvalidToken(String),

    /// Authenticated, but the route requires a different role
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => (StatusCode::UNAUTHORIZED, "No token provided".to_string()),
            AuthError::InvalidToken(_) => {
                (StatusCode::UNAUTHORIZED, "Invalid or expired token".to_string())
            }
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "Access denied: Admins only".to_string()),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Verifies the request's bearer access token
///
/// Returns the identity to attach to the request, or the 401 to return.
/// Expired and malformed tokens produce the same status; the distinction
/// survives in the wrapped [`JwtError`] for logging.
pub fn authenticate(config: &JwtConfig, req: &Request) -> Result<AuthContext, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingCredentials)?;

    let claims = jwt::verify(config, TokenKind::Access, token).map_err(|e| {
        if matches!(e, JwtError::Expired) {
            tracing::debug!("rejected expired access token");
        }
        AuthError::InvalidToken(e.to_string())
    })?;

    Ok(AuthContext::new(claims.sub, claims.role))
}

/// Middleware requiring the authenticated role to be exactly `admin`
///
/// Must run inside an authentication layer; a request that somehow reaches
/// it without an [`AuthContext`] is treated as unauthenticated rather than
/// let through.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AuthError> {
    let ctx = req
        .extensions()
        .get::<AuthContext>()
        .copied()
        .ok_or(AuthError::MissingCredentials)?;

    match ctx.role {
        UserRole::Admin => Ok(next.run(req).await),
        UserRole::User => Err(AuthError::Forbidden),
    }
}
