//! # Taskgate
//!
//! A multi-user task management REST service. Users register, log in for a
//! signed bearer token, and manage their own tasks; administrators can list
//! and remove regular accounts.
//!
//! ## Overview
//!
//! Taskgate can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `taskgate-server` binary
//! 2. **As a library** - Build the router yourself and mount it
//!
//! ### Library Example
//!
//! ```rust,ignore
//! use taskgate::{AppState, build_app, db::DatabaseProvider, utils::toml_config::TaskgateConfig};
//! use std::sync::Arc;
//!
//! let config = TaskgateConfig::load("taskgate.toml")?;
//! let db = DatabaseProvider::from_config(&config.database).create_client().await?;
//! let state = AppState::new(config, Arc::from(db))?;
//! let app = build_app(state);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `turso` | Remote Turso database |
//!
//! ## Modules
//!
//! - [`api`] - REST handlers and routes
//! - [`auth`] - Password hashing, JWT tokens and middleware
//! - [`policy`] - Role and ownership rules
//! - [`domain`] - Task and user operations
//! - [`db`] - Store abstraction (libsql: memory, file, Turso)
//! - [`types`] - Common types and error handling

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Password hashing, JWT tokens and request authentication.
pub mod auth;
/// Command-line scaffolding and terminal output.
pub mod cli;
/// Store clients (local libsql, Turso).
pub mod db;
/// Task and user operations.
pub mod domain;
/// Authorization rules.
pub mod policy;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use db::{DatabaseClient, DatabaseProvider, TursoClient};
pub use domain::{TaskService, UserService};
pub use types::{AppError, Result};
pub use utils::toml_config::TaskgateConfig;

use crate::auth::jwt::AuthService;
use axum::{Router, http::StatusCode, routing::get};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML-based infrastructure configuration
    pub config: Arc<TaskgateConfig>,
    /// Token issuing and validation
    pub auth_service: Arc<AuthService>,
    pub tasks: TaskService,
    pub users: UserService,
}

impl AppState {
    /// Builds the state from a validated config. Fails if the signing secret
    /// is missing.
    pub fn new(config: TaskgateConfig, db: Arc<dyn DatabaseClient>) -> Result<Self> {
        let secret = config
            .jwt_secret()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let auth_service = Arc::new(AuthService::new(&secret, config.auth.token_ttl_secs));

        Ok(Self::with_auth(config, db, auth_service))
    }

    /// Builds the state around an existing [`AuthService`].
    pub fn with_auth(
        config: TaskgateConfig,
        db: Arc<dyn DatabaseClient>,
        auth_service: Arc<AuthService>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            tasks: TaskService::new(db.clone()),
            users: UserService::new(db, auth_service.clone()),
            auth_service,
        }
    }
}

/// The full HTTP application: API routes, health check, request tracing and
/// the per-request timeout from `[server] request_timeout_secs`.
pub fn build_app(state: AppState) -> Router {
    let timeout = state.config.server.request_timeout();

    Router::new()
        .route("/health", get(health_check))
        .merge(api::routes::create_router(state.auth_service.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    timeout,
                )),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
