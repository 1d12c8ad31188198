use crate::auth::jwt::AuthService;
use crate::policy;
use crate::types::{AppError, Identity, Role};
use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Generic rejection text. Which check failed is only ever logged.
const UNAUTHENTICATED: &str = "Authentication required";

/// Pulls the bearer token out of an `Authorization` header value.
///
/// The scheme is matched case-insensitively; the token must be non-empty.
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty() && !token.contains(char::is_whitespace)).then_some(token)
}

/// Resolves the caller's identity from request headers.
pub fn authenticate(auth_service: &AuthService, headers: &HeaderMap) -> Result<Identity, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| {
            tracing::debug!("missing Authorization header");
            AppError::Unauthenticated(UNAUTHENTICATED.to_string())
        })?
        .to_str()
        .map_err(|_| AppError::Unauthenticated(UNAUTHENTICATED.to_string()))?;

    let token = bearer_token(value).ok_or_else(|| {
        tracing::debug!("Authorization header is not a bearer credential");
        AppError::Unauthenticated(UNAUTHENTICATED.to_string())
    })?;

    auth_service.validate(token).map_err(|e| {
        tracing::debug!(reason = %e, "rejected bearer token");
        AppError::Unauthenticated(UNAUTHENTICATED.to_string())
    })
}

/// Authenticates every request it wraps and binds the verified [`Identity`]
/// to that request's extensions.
pub async fn auth_middleware(
    auth_service: Arc<AuthService>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = authenticate(&auth_service, req.headers())?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Rejects callers whose identity is not an administrator.
///
/// Must be layered inside [`auth_middleware`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let identity = req
        .extensions()
        .get::<Identity>()
        .copied()
        .ok_or_else(|| AppError::Unauthenticated(UNAUTHENTICATED.to_string()))?;

    policy::require_role(&identity, Role::Admin)?;

    Ok(next.run(req).await)
}

// Extractor for the request identity
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthenticated(UNAUTHENTICATED.to_string()))
    }
}
