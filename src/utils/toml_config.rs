//! TOML-based configuration for Taskgate
//!
//! Infrastructure settings (server, auth, database) are read once at
//! startup from a TOML file (`taskgate.toml`). Secrets are never written in
//! the file itself: the file names the environment variable that holds
//! them, and `.env` is loaded into the environment before validation.
//!
//! The loaded configuration is immutable for the life of the process.

use crate::auth::jwt::{DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure loaded from taskgate.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskgateConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound on one request, store calls included
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Time in-flight requests get to finish after a shutdown signal
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_shutdown_grace() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            request_timeout_secs: default_request_timeout(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

// ============= Authentication Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable name containing the JWT secret
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: String,

    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
}

fn default_jwt_secret_env() -> String {
    "JWT_SECRET".to_string()
}

fn default_token_ttl() -> i64 {
    DEFAULT_TOKEN_TTL_SECS
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: default_jwt_secret_env(),
            token_ttl_secs: default_token_ttl(),
        }
    }
}

// ============= Database Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local database path, or `:memory:`
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Environment variable for Turso URL (optional cloud config)
    pub turso_url_env: Option<String>,

    /// Environment variable for Turso auth token
    pub turso_token_env: Option<String>,
}

fn default_database_url() -> String {
    "./data/taskgate.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            turso_url_env: None,
            turso_token_env: None,
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl TaskgateConfig {
    /// Load configuration from a TOML file and validate it.
    ///
    /// Any error here is fatal: the server does not start without a valid
    /// config and signing secret.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Parse without validating.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the configuration for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt_secret()?;

        if self.auth.token_ttl_secs <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.token_ttl_secs must be positive".to_string(),
            ));
        }
        if self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::ValidationError(format!(
                "auth.token_ttl_secs must not exceed {}",
                MAX_TOKEN_TTL_SECS
            )));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "server.request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.server.shutdown_grace_secs == 0 {
            return Err(ConfigError::ValidationError(
                "server.shutdown_grace_secs must be positive".to_string(),
            ));
        }

        // Validate database env vars if specified
        if let Some(ref env) = self.database.turso_url_env {
            self.validate_env_var(env)?;
        }
        if let Some(ref env) = self.database.turso_token_env {
            self.validate_env_var(env)?;
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get the JWT secret from the environment. Unset or blank is an error.
    pub fn jwt_secret(&self) -> Result<String, ConfigError> {
        let secret = std::env::var(&self.auth.jwt_secret_env)
            .map_err(|_| ConfigError::MissingEnvVar(self.auth.jwt_secret_env.clone()))?;

        if secret.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "Environment variable '{}' is empty",
                self.auth.jwt_secret_env
            )));
        }

        Ok(secret)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
