/// Configuration management for the API server
///
/// Configuration is loaded once from environment variables into an
/// immutable struct and passed explicitly to everything that needs it; no
/// part of the system reads the environment after startup.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `API_HOST`: host to bind to (default: 0.0.0.0)
/// - `API_PORT`: port to bind to (default: 8080)
/// - `ACCESS_TOKEN_SECRET`: access-token signing key (required, >= 32 chars)
/// - `REFRESH_TOKEN_SECRET`: refresh-token signing key (required, >= 32 chars)
/// - `ACCESS_TOKEN_TTL_SECS`: access-token lifetime (default: 900)
/// - `REFRESH_TOKEN_TTL_SECS`: refresh-token lifetime (default: 604800)
/// - `CORS_ORIGINS`: comma-separated allowed origins, or `*` (default: `*`)
/// - `ENVIRONMENT`: `production` enables HSTS and Secure cookies
///   (default: development)
/// - `RUST_LOG`: log filter (default: info)

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;

use taskboard_shared::auth::jwt::{JwtConfig, TokenKeys};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Token configuration
    pub jwt: JwtSettings,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `["*"]` means permissive (development)
    pub cors_origins: Vec<String>,

    /// Production mode: HSTS on, refresh cookie marked Secure
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Token signing configuration
///
/// Two independent secret/lifetime pairs, one per token kind. Secrets
/// never appear in logs or serialized output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtSettings {
    #[serde(skip_serializing)]
    pub access_secret: String,

    pub access_ttl_secs: i64,

    #[serde(skip_serializing)]
    pub refresh_secret: String,

    pub refresh_ttl_secs: i64,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a numeric
    /// variable fails to parse, or a signing secret is shorter than 32
    /// characters.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let production = env::var("ENVIRONMENT")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let access_secret = require_secret("ACCESS_TOKEN_SECRET")?;
        let refresh_secret = require_secret("REFRESH_TOKEN_SECRET")?;

        let access_ttl_secs = env::var("ACCESS_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| "900".to_string())
            .parse::<i64>()?;

        let refresh_ttl_secs = env::var("REFRESH_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| "604800".to_string())
            .parse::<i64>()?;

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtSettings {
                access_secret,
                access_ttl_secs,
                refresh_secret,
                refresh_ttl_secs,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Builds the token service's per-kind configuration table
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::new(
            TokenKeys {
                secret: self.jwt.access_secret.clone(),
                ttl: Duration::seconds(self.jwt.access_ttl_secs),
            },
            TokenKeys {
                secret: self.jwt.refresh_secret.clone(),
                ttl: Duration::seconds(self.jwt.refresh_ttl_secs),
            },
        )
    }
}

fn require_secret(name: &str) -> anyhow::Result<String> {
    let value =
        env::var(name).map_err(|_| anyhow::anyhow!("{} environment variable is required", name))?;

    if value.len() < 32 {
        anyhow::bail!("{} must be at least 32 characters long", name);
    }

    Ok(value)
}
