/// Common test utilities for integration tests
///
/// Provides shared infrastructure:
/// - Test database setup (real Postgres via `DATABASE_URL`)
/// - Test user creation with unique emails
/// - Token minting
/// - Request helpers driving the router in-process via `tower::Service`
///
/// Required environment: `DATABASE_URL`, `ACCESS_TOKEN_SECRET`,
/// `REFRESH_TOKEN_SECRET` (a `.env` file works).

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use sqlx::PgPool;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::auth::{jwt, password};
use taskboard_shared::models::user::{CreateUser, User, UserRole};
use tower::Service as _;
use uuid::Uuid;

/// Password used for every test account
pub const TEST_PASSWORD: &str = "pw123456";

/// Test context containing the app and its backing resources
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub state: AppState,
    created_users: Vec<Uuid>,
}

impl TestContext {
    /// Creates a new test context against the configured database
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Path relative to this crate's Cargo.toml
        sqlx::migrate!("../migrations").run(&db).await?;

        let state = AppState::new(db.clone(), config);
        let app = build_router(state.clone());

        Ok(Self {
            db,
            app,
            state,
            created_users: Vec::new(),
        })
    }

    /// Creates a user directly in the store with a unique email
    pub async fn create_user(&mut self, role: UserRole) -> anyhow::Result<User> {
        let marker = Uuid::new_v4().simple().to_string();
        let user = User::create(
            &self.db,
            CreateUser {
                username: format!("user-{}", &marker[..8]),
                email: format!("{}@taskboard.test", marker),
                password_hash: password::hash_password(TEST_PASSWORD)?,
                role,
            },
        )
        .await?;

        self.created_users.push(user.id);
        Ok(user)
    }

    /// Registers a store-created user for cleanup (for accounts created
    /// through the API)
    pub fn track_user(&mut self, id: Uuid) {
        self.created_users.push(id);
    }

    /// Mints an access token for a user
    pub fn token_for(&self, user: &User) -> String {
        jwt::issue(&self.state.jwt, jwt::TokenKind::Access, user.id, user.role)
            .expect("Should issue token")
    }

    /// `Authorization` header value for a user
    pub fn auth_header(&self, user: &User) -> String {
        format!("Bearer {}", self.token_for(user))
    }

    /// A unique test email
    pub fn unique_email(&self) -> String {
        format!("{}@taskboard.test", Uuid::new_v4().simple())
    }

    /// Deletes every user this context created (tasks cascade)
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        for id in &self.created_users {
            User::delete(&self.db, *id).await?;
        }
        Ok(())
    }
}

/// Sends a request to the router and returns the raw response
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    auth: Option<&str>,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().call(request).await.unwrap()
}

/// Consumes a response into its status and parsed JSON body
///
/// An empty body parses as `Value::Null`.
pub async fn read_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Extracts the refresh cookie (`name=value`) from a login response
pub fn refresh_cookie_from(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.to_string())
}
