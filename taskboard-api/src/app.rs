/// Application state and router builder
///
/// This module defines the shared application state and builds the axum
/// router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskboard_shared::auth::{
    jwt::JwtConfig,
    middleware::{authenticate, require_admin},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via axum's `State` extractor. Uses Arc
/// internally for cheap cloning; everything inside is read-only after
/// startup except the pool, which manages its own synchronization.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Token service configuration (per-kind secrets and lifetimes)
    pub jwt: Arc<JwtConfig>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        let jwt = Arc::new(config.jwt_config());
        Self {
            db,
            config: Arc::new(config),
            jwt,
        }
    }
}

/// Builds the complete axum router
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                       # Health check (public)
/// └── /api/
///     ├── /auth/                    # Session lifecycle (public)
///     │   ├── POST /register
///     │   ├── POST /login
///     │   ├── POST /refresh         # reads the refresh cookie
///     │   └── POST /logout
///     ├── /users/                   # Authenticated
///     │   ├── GET|PUT|DELETE /me
///     │   └── admin only: GET|POST /, PUT|DELETE /:id
///     └── /tasks/                   # Authenticated
///         ├── GET|POST /
///         ├── GET /assigned
///         ├── PUT|DELETE /:id
///         ├── PATCH /:id/status
///         ├── PATCH /:id/respond
///         └── admin only: GET /admin/all, PUT|DELETE /admin/:id,
///                         POST /assign
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first): security headers, CORS, request
/// tracing; then per-group bearer authentication, then the admin gate on
/// the admin subsets.
pub fn build_router(state: AppState) -> Router {
    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Session lifecycle (public; refresh/logout work on the cookie alone)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/logout", post(routes::auth::logout));

    // User management: /me for any authenticated user, the rest admin-only
    let user_admin_routes = Router::new()
        .route(
            "/",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/:id",
            put(routes::users::update_user).delete(routes::users::delete_user),
        )
        .route_layer(axum::middleware::from_fn(require_admin));

    let user_routes = Router::new()
        .route(
            "/me",
            get(routes::users::get_profile)
                .put(routes::users::update_profile)
                .delete(routes::users::delete_profile),
        )
        .merge(user_admin_routes);

    // Tasks: ownership-scoped operations plus the admin surface
    let task_admin_routes = Router::new()
        .route("/admin/all", get(routes::tasks::list_all_tasks))
        .route(
            "/admin/:id",
            put(routes::tasks::admin_update_task).delete(routes::tasks::admin_delete_task),
        )
        .route("/assign", post(routes::tasks::assign_task))
        .route_layer(axum::middleware::from_fn(require_admin));

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/assigned", get(routes::tasks::list_assigned_tasks))
        .route(
            "/:id",
            put(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        .route("/:id/status", patch(routes::tasks::update_task_status))
        .route("/:id/respond", patch(routes::tasks::respond_to_task))
        .merge(task_admin_routes);

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest(
            "/users",
            user_routes.layer(axum::middleware::from_fn_with_state(
                state.clone(),
                auth_layer,
            )),
        )
        .nest(
            "/tasks",
            task_routes.layer(axum::middleware::from_fn_with_state(
                state.clone(),
                auth_layer,
            )),
        );

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Bearer authentication middleware layer
///
/// Verifies the access token and injects the resolved identity into the
/// request extensions; everything behind this layer can assume an
/// `AuthContext` is present.
async fn auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let ctx = authenticate(&state.jwt, &req)?;
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}
