//! HTTP API Handlers and Routes
//!
//! The REST layer for Taskgate, built on Axum.
//!
//! # API Endpoints
//!
//! ## Accounts
//! - `POST /register` - Register a regular user (optionally with a first task)
//! - `POST /login` - Login and receive a JWT
//!
//! ## Tasks (bearer token required)
//! - `GET /tasks` - List the caller's tasks
//! - `POST /task` - Create a task
//! - `POST /tasks/bulk` - Create several tasks atomically
//! - `GET /tasks/{id}` - Get a task
//! - `PUT /tasks/{id}` - Replace a task's text
//! - `PATCH /tasks/{id}/status` - Set a task's completion status
//! - `DELETE /tasks/{id}` - Delete a task
//!
//! ## Admin (administrator token required)
//! - `GET /admin/users` - List all accounts
//! - `DELETE /admin/user/{id}` - Delete a regular user and their tasks
//!
//! ## Health
//! - `GET /health` - Liveness check, added by [`build_app`](crate::build_app)
//!
//! ## Documentation
//! - `GET /api-docs/openapi.json` - OpenAPI document for the routes above
//!
//! # Authentication
//!
//! Protected endpoints require a valid JWT in the `Authorization` header:
//! ```text
//! Authorization: Bearer <token>
//! ```

/// OpenAPI document assembled from the handler annotations.
pub mod docs;
/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
