//! Task and user operations.
//!
//! Services here take the caller's [`Identity`](crate::types::Identity)
//! explicitly on every call, run the relevant [`policy`](crate::policy)
//! gates, and then talk to the [`DatabaseClient`](crate::db::DatabaseClient).
//! Nothing is looked up from ambient request state, so each operation can be
//! exercised directly in tests.

/// Task CRUD under the ownership gate.
pub mod tasks;
/// Registration, login and admin account management.
pub mod users;

pub use tasks::TaskService;
pub use users::UserService;

use crate::types::{AppError, Result};

/// Longest accepted task text, in characters.
pub const MAX_TASK_LEN: usize = 1000;
/// Largest batch accepted by bulk task creation.
pub const MAX_BULK_TASKS: usize = 100;
/// Longest accepted username, in characters.
pub const MAX_USERNAME_LEN: usize = 64;

/// Trims and checks task text.
pub fn validate_task_text(text: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Task text must not be empty".to_string()));
    }
    if text.chars().count() > MAX_TASK_LEN {
        return Err(AppError::Validation(format!(
            "Task text must be at most {} characters",
            MAX_TASK_LEN
        )));
    }
    Ok(text.to_string())
}

pub fn validate_username(username: &str) -> Result<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::Validation(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LEN
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(
            "Username must not contain whitespace".to_string(),
        ));
    }
    Ok(username.to_string())
}

/// Email is optional; when given it must look like `local@domain`.
pub fn validate_email(email: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() {
        return Ok(String::new());
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email.to_string())
        }
        _ => Err(AppError::Validation("Email address is invalid".to_string())),
    }
}
