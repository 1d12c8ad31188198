//! Admin user management handlers.
//!
//! Both routes sit behind the auth middleware. The listing is also wrapped
//! in [`require_admin`](crate::auth::middleware::require_admin); the
//! services re-check the role themselves either way.

use crate::{
    AppState,
    auth::middleware::AuthUser,
    types::{MessageResponse, Result, UserProfile},
};
use axum::{
    Json,
    extract::{Path, State},
};

/// List all accounts.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "All users", body = Vec<UserProfile>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not an administrator")
    ),
    tag = "admin",
    security(("bearer" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<UserProfile>>> {
    Ok(Json(state.users.list_users(&identity).await?))
}

/// Delete a regular user together with their tasks.
#[utoipa::path(
    delete,
    path = "/admin/user/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 403, description = "Not an administrator, self-deletion, or admin target"),
        (status = 404, description = "User not found")
    ),
    tag = "admin",
    security(("bearer" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    state.users.delete_user(&identity, id).await?;
    Ok(Json(MessageResponse {
        message: format!("User {} deleted", id),
    }))
}
