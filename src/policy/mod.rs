//! Authorization policy.
//!
//! Pure decision functions evaluated after authentication and before any
//! domain logic runs a mutating query. They never touch the store
//! themselves: callers pass in the facts read from the *current* row.
//!
//! - **Role gate**: [`require_role`]
//! - **Ownership gate**: ownership is enforced by the store's conditional
//!   statements (`WHERE id = ? AND user_id = ?`); when such a statement
//!   matches nothing, [`ownership_miss`] turns the existence check into
//!   `NotFound` or `Forbidden`.
//! - **Account deletion**: [`check_user_deletion`] and
//!   [`check_deletion_target`]

use crate::types::{AppError, Identity, Result, Role};

/// Requires the caller to hold `required`.
///
/// Role ordering is exhaustive: admins satisfy user-level gates, users only
/// satisfy user-level gates.
pub fn require_role(identity: &Identity, required: Role) -> Result<()> {
    let allowed = match required {
        Role::User => true,
        Role::Admin => identity.role.is_admin(),
    };

    if allowed {
        Ok(())
    } else {
        tracing::warn!(
            user_id = identity.user_id,
            role = %identity.role,
            required = %required,
            "role gate denied request"
        );
        Err(AppError::Forbidden("Insufficient permissions".to_string()))
    }
}

/// Resolves a conditional task statement that matched no row.
///
/// `exists` is whether a task with that id is present at all. Absent rows
/// are `NotFound`; rows owned by someone else are `Forbidden`. The same
/// rule applies to every task operation.
pub fn ownership_miss(identity: &Identity, task_id: i64, exists: bool) -> AppError {
    if exists {
        tracing::warn!(
            user_id = identity.user_id,
            task_id,
            "ownership gate denied access to task"
        );
        AppError::Forbidden("Access to this task is forbidden".to_string())
    } else {
        AppError::NotFound(format!("Task {} not found", task_id))
    }
}

/// Checks that don't need the target row: never oneself, and admin role.
///
/// Self-deletion is refused first so the answer is the same for every role.
pub fn check_user_deletion(identity: &Identity, target_id: i64) -> Result<()> {
    if identity.user_id == target_id {
        return Err(AppError::SelfDeleteForbidden);
    }

    require_role(identity, Role::Admin)
}

/// Checks against the target's current role. Admin accounts are never
/// deletable through the API, whoever asks.
pub fn check_deletion_target(target_role: Role) -> Result<()> {
    match target_role {
        Role::Admin => Err(AppError::AdminProtected),
        Role::User => Ok(()),
    }
}
