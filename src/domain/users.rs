use crate::auth::jwt::AuthService;
use crate::auth::password;
use crate::db::{DatabaseClient, NewUser};
use crate::domain::{validate_email, validate_task_text, validate_username};
use crate::policy;
use crate::types::{
    AppError, Identity, RegisterRequest, RegisterResponse, Result, Role, TokenResponse, UserProfile,
};
use std::sync::Arc;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Account operations: registration, login, and admin management.
#[derive(Clone)]
pub struct UserService {
    db: Arc<dyn DatabaseClient>,
    auth: Arc<AuthService>,
}

impl UserService {
    pub fn new(db: Arc<dyn DatabaseClient>, auth: Arc<AuthService>) -> Self {
        Self { db, auth }
    }

    /// Registers a regular user, optionally together with a first task.
    ///
    /// With `initial_task` both rows are written in one transaction.
    pub async fn register(&self, request: RegisterRequest) -> Result<RegisterResponse> {
        let username = validate_username(&request.username)?;
        let email = validate_email(&request.email)?;
        if request.password.is_empty() {
            return Err(AppError::Validation("Password is required".to_string()));
        }
        let initial_task = request
            .initial_task
            .as_deref()
            .map(validate_task_text)
            .transpose()?;

        let new_user = NewUser {
            username,
            email,
            password_hash: hash_blocking(request.password).await?,
            role: Role::User,
        };

        let (record, task) = match initial_task {
            Some(text) => {
                let (record, task) = self
                    .db
                    .create_user_with_initial_task(&new_user, &text)
                    .await?;
                (record, Some(task))
            }
            None => (self.db.create_user(&new_user).await?, None),
        };

        tracing::info!(user_id = record.id, username = %record.username, "registered user");

        Ok(RegisterResponse {
            user: record.profile(),
            initial_task: task,
        })
    }

    /// Checks credentials and issues a token.
    ///
    /// Unknown usernames and wrong passwords produce the same error.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let Some(user) = self.db.get_user_by_username(username.trim()).await? else {
            tracing::debug!("login attempt for unknown username");
            return Err(AppError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_blocking(password.to_string(), user.password_hash.clone()).await? {
            tracing::debug!(user_id = user.id, "login attempt with wrong password");
            return Err(AppError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        }

        tracing::info!(user_id = user.id, "user logged in");
        self.auth.login_response(user.id, user.role)
    }

    /// Admin only.
    pub async fn list_users(&self, identity: &Identity) -> Result<Vec<UserProfile>> {
        policy::require_role(identity, Role::Admin)?;

        let users = self.db.list_users().await?;
        Ok(users.iter().map(|u| u.profile()).collect())
    }

    /// Deletes a regular user and their tasks.
    ///
    /// Refuses self-deletion and admin targets for every caller. The delete
    /// is conditional on the target still being a regular user, so a role
    /// change racing this call cannot remove an admin.
    pub async fn delete_user(&self, identity: &Identity, target_id: i64) -> Result<()> {
        policy::check_user_deletion(identity, target_id)?;

        let target = self
            .db
            .get_user_by_id(target_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", target_id)))?;
        policy::check_deletion_target(target.role)?;

        if !self.db.delete_user_with_role(target_id, Role::User).await? {
            // The row changed between the lookup and the delete.
            return match self.db.get_user_by_id(target_id).await? {
                None => Err(AppError::NotFound(format!("User {} not found", target_id))),
                Some(current) => {
                    policy::check_deletion_target(current.role)?;
                    Err(AppError::Conflict(format!(
                        "User {} changed during deletion",
                        target_id
                    )))
                }
            };
        }

        tracing::info!(admin_id = identity.user_id, target_id, "deleted user");
        Ok(())
    }

    /// Creates an administrator directly. Used by the `create-admin` CLI
    /// command; there is no HTTP route that grants the admin role.
    pub async fn create_admin(&self, username: &str, email: &str, password: &str) -> Result<UserProfile> {
        let username = validate_username(username)?;
        let email = validate_email(email)?;
        if password.is_empty() {
            return Err(AppError::Validation("Password is required".to_string()));
        }

        let record = self
            .db
            .create_user(&NewUser {
                username,
                email,
                password_hash: hash_blocking(password.to_string()).await?,
                role: Role::Admin,
            })
            .await?;

        tracing::info!(user_id = record.id, "created administrator");
        Ok(record.profile())
    }
}

// Argon2 blocks for tens of milliseconds; run it on the blocking pool.
async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

async fn verify_blocking(password: String, digest: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&password, &digest))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))
}
