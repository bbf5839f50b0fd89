//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the database URL, encryption key material, API token, CORS origins and
//! the deployment script path used for base-path stripping.

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    /// Symmetric key material for the organizer-id codec. May be empty, in
    /// which case encrypted responses degrade to the "Encryption failed"
    /// envelope and encrypted identity channels stop resolving.
    pub encryption_key: String,
    pub api_version: String,
    /// Static API token. Empty disables authentication entirely.
    pub api_token: String,
    /// Extra paths (exact or prefix) that skip authentication, on top of the
    /// built-in health/auth/login allowlist.
    pub auth_bypass_routes: Vec<String>,
    pub cors_allowed_origins: Vec<String>,
    pub server_port: u16,
    /// Deployment script location, e.g. `/app/public/index.php`. Determines
    /// the base path stripped from incoming request URIs.
    pub script_path: String,
    /// Accept a plain numeric organizer id when decryption fails. Off by
    /// default; only meant for local testing.
    pub allow_plain_organizer_id: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let encryption_key = env::var("ENCRYPTION_KEY").unwrap_or_default();

        let api_version = env::var("API_VERSION").unwrap_or_else(|_| "v1".to_string());

        let api_token = env::var("API_TOKEN").unwrap_or_default();

        let auth_bypass_routes = env::var("API_AUTH_BYPASS_ROUTES")
            .map(|raw| {
                raw.split(',')
                    .map(|route| route.trim().to_string())
                    .filter(|route| !route.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| vec!["/health".to_string()]);

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:4200".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let script_path = env::var("APP_SCRIPT_PATH").unwrap_or_default();

        let allow_plain_organizer_id = env::var("ALLOW_PLAIN_ORGANIZER_ID")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            encryption_key,
            api_version,
            api_token,
            auth_bypass_routes,
            cors_allowed_origins,
            server_port,
            script_path,
            allow_plain_organizer_id,
        })
    }
}

#[cfg(test)]
impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "postgres://localhost/organizer_test".to_string(),
            max_connections: 5,
            acquire_timeout_seconds: 3,
            encryption_key: "test-encryption-key".to_string(),
            api_version: "v1".to_string(),
            api_token: String::new(),
            auth_bypass_routes: vec!["/health".to_string()],
            cors_allowed_origins: vec!["http://localhost:4200".to_string()],
            server_port: 8000,
            script_path: String::new(),
            allow_plain_organizer_id: false,
        }
    }
}
