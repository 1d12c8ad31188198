//! API request handlers.
//!
//! Handlers only translate between HTTP and the domain services on
//! [`AppState`](crate::AppState); rules live in [`domain`](crate::domain)
//! and [`policy`](crate::policy).

/// Registration and login handlers.
pub mod auth;
/// Task CRUD handlers.
pub mod tasks;
/// Admin user management handlers.
pub mod users;
