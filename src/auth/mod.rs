//! Credentials, Tokens and Request Authentication
//!
//! This module provides the authentication layer of Taskgate: password
//! hashing, JWT issuance/validation, and the Axum middleware that turns an
//! `Authorization` header into a verified [`Identity`](crate::types::Identity).
//!
//! # Module Structure
//!
//! - [`auth::password`](crate::auth::password) - Argon2id password hashing and verification
//! - [`auth::jwt`](crate::auth::jwt) - Token issuance, validation and [`TokenError`](crate::auth::jwt::TokenError)
//! - [`auth::middleware`](crate::auth::middleware) - Axum layers and extractors for authentication
//!
//! # Security Features
//!
//! - **Password Hashing**: Argon2id (memory-hard), PHC strings, random salts
//! - **JWT Tokens**: HS256, one-hour default lifetime, no server-side state
//! - **Claims**: `user_id`, `role`, `iat`, `exp`
//!
//! # Usage
//!
//! ## Token Generation
//!
//! ```ignore
//! use taskgate::auth::jwt::AuthService;
//! use taskgate::types::Role;
//!
//! let auth = AuthService::new(&jwt_secret, 3600);
//! let token = auth.issue(user_id, Role::User)?;
//! ```
//!
//! ## Middleware
//!
//! `auth_middleware` validates the bearer token and inserts the `Identity`
//! into the request extensions; `require_admin` gates admin-only routes:
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/protected", get(handler))
//!     .layer(middleware::from_fn(move |req, next| {
//!         auth_middleware(auth_service.clone(), req, next)
//!     }));
//! ```
//!
//! ## Extracting the Identity in Handlers
//!
//! ```ignore
//! async fn protected_handler(AuthUser(identity): AuthUser) -> impl IntoResponse {
//!     format!("Hello, user {}!", identity.user_id)
//! }
//! ```

/// Token issuance and validation.
pub mod jwt;
/// Authentication middleware and extractors for protected routes.
pub mod middleware;
/// Password hashing and verification.
pub mod password;
