//! Database abstraction traits
//!
//! This module provides the `DatabaseClient` trait that abstracts over the
//! store backends (in-memory SQLite, file-based SQLite, remote Turso).
//!
//! Every task read or mutation takes the caller's id as `owner_id` and is a
//! single conditional statement (`WHERE id = ? AND user_id = ?`), so the
//! ownership check and the mutation cannot be separated by a concurrent
//! request. Composite writes are all-or-nothing.
//!
//! # Example
//!
//! ```rust,ignore
//! use taskgate::db::{DatabaseClient, DatabaseProvider};
//!
//! // Use in-memory database (default for development/testing)
//! let db = DatabaseProvider::Memory.create_client().await?;
//!
//! // Use file-based SQLite
//! let db = DatabaseProvider::SQLite { path: "data.db".into() }.create_client().await?;
//! ```

use crate::types::{AppError, Result, Role, Task};
use crate::utils::toml_config::DatabaseConfig;
use async_trait::async_trait;
use std::path::Path;

/// User record from the database
pub use super::turso::{NewUser, UserRecord};

/// Database provider configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DatabaseProvider {
    /// In-memory SQLite database (ephemeral, lost on restart)
    #[default]
    Memory,
    /// File-based SQLite database
    SQLite {
        /// Path to the SQLite database file
        path: String,
    },
    /// Remote Turso database (requires network access)
    #[cfg(feature = "turso")]
    Turso {
        /// The Turso database URL (e.g., `libsql://your-db.turso.io`)
        url: String,
        /// Authentication token for the Turso database
        auth_token: String,
    },
}

/// Prints the backend without the auth token.
impl std::fmt::Display for DatabaseProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseProvider::Memory => write!(f, "memory"),
            DatabaseProvider::SQLite { path } => write!(f, "sqlite:{}", path),
            #[cfg(feature = "turso")]
            DatabaseProvider::Turso { url, .. } => write!(f, "turso:{}", url),
        }
    }
}

impl DatabaseProvider {
    /// Create a database client from this provider configuration
    pub async fn create_client(&self) -> Result<Box<dyn DatabaseClient>> {
        match self {
            DatabaseProvider::Memory => {
                let client = super::turso::TursoClient::new_memory().await?;
                Ok(Box::new(client))
            }
            DatabaseProvider::SQLite { path } => {
                if let Some(parent) = Path::new(path).parent()
                    && !parent.as_os_str().is_empty()
                {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        AppError::Database(format!(
                            "Failed to create database directory {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
                let client = super::turso::TursoClient::new_local(path).await?;
                Ok(Box::new(client))
            }
            #[cfg(feature = "turso")]
            DatabaseProvider::Turso { url, auth_token } => {
                let client =
                    super::turso::TursoClient::new_remote(url.clone(), auth_token.clone()).await?;
                Ok(Box::new(client))
            }
        }
    }

    /// Resolve the provider from the `[database]` config section.
    ///
    /// A configured Turso URL/token pair wins; otherwise `url` is a SQLite
    /// path, with `:memory:` (or an empty string) meaning in-memory.
    pub fn from_config(config: &DatabaseConfig) -> Self {
        #[cfg(feature = "turso")]
        {
            if let (Some(url_env), Some(token_env)) =
                (&config.turso_url_env, &config.turso_token_env)
                && let (Ok(url), Ok(token)) = (std::env::var(url_env), std::env::var(token_env))
                && !url.is_empty()
                && !token.is_empty()
            {
                return DatabaseProvider::Turso {
                    url,
                    auth_token: token,
                };
            }
        }

        if config.url.is_empty() || config.url == ":memory:" {
            DatabaseProvider::Memory
        } else {
            DatabaseProvider::SQLite {
                path: config.url.clone(),
            }
        }
    }
}

/// Abstract trait for database operations
///
/// This trait defines all store operations the domain layer needs.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    // ============== User Operations ==============

    /// Insert a user. A taken username is `Conflict`.
    async fn create_user(&self, user: &NewUser) -> Result<UserRecord>;

    /// Insert a user and one task owned by it in a single transaction.
    async fn create_user_with_initial_task(
        &self,
        user: &NewUser,
        task: &str,
    ) -> Result<(UserRecord, Task)>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    async fn get_user_by_id(&self, id: i64) -> Result<Option<UserRecord>>;

    async fn list_users(&self) -> Result<Vec<UserRecord>>;

    /// Delete a user and their tasks, but only while the user still has
    /// `role`. Returns whether a row was deleted.
    async fn delete_user_with_role(&self, id: i64, role: Role) -> Result<bool>;

    // ============== Task Operations ==============

    async fn create_task(&self, owner_id: i64, text: &str) -> Result<Task>;

    /// Insert every task or none of them.
    async fn create_tasks_in_bulk(&self, owner_id: i64, texts: &[String]) -> Result<Vec<Task>>;

    async fn list_tasks_by_owner(&self, owner_id: i64) -> Result<Vec<Task>>;

    async fn get_task_for_owner(&self, id: i64, owner_id: i64) -> Result<Option<Task>>;

    async fn update_task_for_owner(
        &self,
        id: i64,
        owner_id: i64,
        text: &str,
    ) -> Result<Option<Task>>;

    async fn update_task_status_for_owner(
        &self,
        id: i64,
        owner_id: i64,
        status: bool,
    ) -> Result<Option<Task>>;

    async fn delete_task_for_owner(&self, id: i64, owner_id: i64) -> Result<bool>;

    /// Existence check used to tell "absent" from "not yours".
    async fn task_exists(&self, id: i64) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database_config(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            turso_url_env: None,
            turso_token_env: None,
        }
    }

    #[test]
    fn test_provider_from_config() {
        assert_eq!(
            DatabaseProvider::from_config(&database_config(":memory:")),
            DatabaseProvider::Memory
        );
        assert_eq!(
            DatabaseProvider::from_config(&database_config("")),
            DatabaseProvider::Memory
        );
        assert_eq!(
            DatabaseProvider::from_config(&database_config("./data/tasks.db")),
            DatabaseProvider::SQLite {
                path: "./data/tasks.db".to_string()
            }
        );
    }

    #[test]
    fn test_provider_display() {
        assert_eq!(DatabaseProvider::Memory.to_string(), "memory");
        assert_eq!(
            DatabaseProvider::SQLite {
                path: "tasks.db".to_string()
            }
            .to_string(),
            "sqlite:tasks.db"
        );
    }

    #[tokio::test]
    async fn test_create_sqlite_client_in_new_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("taskgate.db");

        let provider = DatabaseProvider::SQLite {
            path: path.to_string_lossy().into_owned(),
        };
        let client = provider.create_client().await.expect("should open file db");

        assert!(client.list_users().await.expect("should query").is_empty());
        assert!(path.exists());
    }
}
