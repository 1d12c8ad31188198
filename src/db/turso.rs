use crate::db::traits::DatabaseClient;
use crate::types::{AppError, Result, Role, Task, UserProfile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection, Database, Row};
use std::ops::Deref;
use tokio::sync::{Mutex, MutexGuard};

const TASK_COLUMNS: &str = "id, user_id, task, status, created_at, updated_at";
const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at";

/// libsql-backed store for users and tasks.
///
/// Local files and remote Turso databases open a fresh connection per
/// operation. An in-memory database only exists on the connection that
/// created it, so that connection is kept behind a lock and each operation
/// holds it from first statement to commit or rollback.
pub struct TursoClient {
    db: Database,
    shared: Option<Mutex<Connection>>,
}

/// A connection held for the length of one store operation.
pub enum ConnectionLease<'a> {
    Shared(MutexGuard<'a, Connection>),
    Owned(Connection),
}

impl Deref for ConnectionLease<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        match self {
            ConnectionLease::Shared(guard) => guard,
            ConnectionLease::Owned(conn) => conn,
        }
    }
}

impl TursoClient {
    /// Opens an ephemeral in-memory database.
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {}", e)))?;
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(db_error("enable foreign keys"))?;

        let client = Self {
            db,
            shared: Some(Mutex::new(conn)),
        };
        client.initialize_schema().await?;

        Ok(client)
    }

    /// Opens (or creates) a SQLite file.
    pub async fn new_local(path: &str) -> Result<Self> {
        if path == ":memory:" {
            return Self::new_memory().await;
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open {}: {}", path, e)))?;

        let client = Self { db, shared: None };
        client.initialize_schema().await?;

        Ok(client)
    }

    /// Connects to a remote Turso database.
    pub async fn new_remote(url: String, auth_token: String) -> Result<Self> {
        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Turso: {}", e)))?;

        let client = Self { db, shared: None };
        client.initialize_schema().await?;

        Ok(client)
    }

    /// Leases a connection. The shared in-memory connection stays locked
    /// until the lease is dropped.
    pub async fn connection(&self) -> Result<ConnectionLease<'_>> {
        if let Some(shared) = &self.shared {
            return Ok(ConnectionLease::Shared(shared.lock().await));
        }

        let conn = self
            .db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(db_error("enable foreign keys"))?;

        Ok(ConnectionLease::Owned(conn))
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection().await?;

        // Users table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                email TEXT NOT NULL DEFAULT '',
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
                created_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        // Tasks table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                task TEXT NOT NULL CHECK (length(trim(task)) > 0 AND length(task) <= 1000),
                status INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create tasks table: {}", e)))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_user_id ON tasks(user_id)",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create tasks index: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl DatabaseClient for TursoClient {
    async fn create_user(&self, user: &NewUser) -> Result<UserRecord> {
        let conn = self.connection().await?;
        insert_user(&conn, user).await
    }

    async fn create_user_with_initial_task(
        &self,
        user: &NewUser,
        task: &str,
    ) -> Result<(UserRecord, Task)> {
        let conn = self.connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(db_error("begin transaction"))?;

        let outcome = async {
            let record = insert_user(&tx, user).await?;
            let task = insert_task(&tx, record.id, task).await?;
            Ok::<_, AppError>((record, task))
        }
        .await;

        match outcome {
            Ok(created) => {
                tx.commit().await.map_err(db_error("commit transaction"))?;
                Ok(created)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(error = %rollback, "failed to roll back user registration");
                }
                Err(e)
            }
        }
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let conn = self.connection().await?;

        let mut rows = conn
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"),
                [username],
            )
            .await
            .map_err(db_error("query user"))?;

        match rows.next().await.map_err(db_error("read user"))? {
            Some(row) => Ok(Some(user_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        let conn = self.connection().await?;

        let mut rows = conn
            .query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"), [id])
            .await
            .map_err(db_error("query user"))?;

        match rows.next().await.map_err(db_error("read user"))? {
            Some(row) => Ok(Some(user_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let conn = self.connection().await?;

        let mut rows = conn
            .query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"), ())
            .await
            .map_err(db_error("query users"))?;

        let mut users = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_error("read user"))? {
            users.push(user_from_row(&row)?);
        }

        Ok(users)
    }

    async fn delete_user_with_role(&self, id: i64, role: Role) -> Result<bool> {
        let conn = self.connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(db_error("begin transaction"))?;

        let outcome = async {
            tx.execute(
                "DELETE FROM tasks WHERE user_id = ?
                 AND (SELECT role FROM users WHERE id = ?) = ?",
                (id, id, role.as_str()),
            )
            .await
            .map_err(db_error("delete user tasks"))?;

            tx.execute(
                "DELETE FROM users WHERE id = ? AND role = ?",
                (id, role.as_str()),
            )
            .await
            .map_err(db_error("delete user"))
        }
        .await;

        match outcome {
            Ok(0) => {
                tx.rollback().await.map_err(db_error("roll back transaction"))?;
                Ok(false)
            }
            Ok(_) => {
                tx.commit().await.map_err(db_error("commit transaction"))?;
                Ok(true)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(error = %rollback, "failed to roll back user deletion");
                }
                Err(e)
            }
        }
    }

    async fn create_task(&self, owner_id: i64, text: &str) -> Result<Task> {
        let conn = self.connection().await?;
        insert_task(&conn, owner_id, text).await
    }

    async fn create_tasks_in_bulk(&self, owner_id: i64, texts: &[String]) -> Result<Vec<Task>> {
        let conn = self.connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(db_error("begin transaction"))?;

        let outcome = async {
            let mut tasks = Vec::with_capacity(texts.len());
            for text in texts {
                tasks.push(insert_task(&tx, owner_id, text).await?);
            }
            Ok::<_, AppError>(tasks)
        }
        .await;

        match outcome {
            Ok(tasks) => {
                tx.commit().await.map_err(db_error("commit transaction"))?;
                Ok(tasks)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(error = %rollback, "failed to roll back bulk task insert");
                }
                Err(e)
            }
        }
    }

    async fn list_tasks_by_owner(&self, owner_id: i64) -> Result<Vec<Task>> {
        let conn = self.connection().await?;

        let mut rows = conn
            .query(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ? ORDER BY id"),
                [owner_id],
            )
            .await
            .map_err(db_error("query tasks"))?;

        let mut tasks = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_error("read task"))? {
            tasks.push(task_from_row(&row)?);
        }

        Ok(tasks)
    }

    async fn get_task_for_owner(&self, id: i64, owner_id: i64) -> Result<Option<Task>> {
        let conn = self.connection().await?;

        let mut rows = conn
            .query(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ? AND user_id = ?"),
                (id, owner_id),
            )
            .await
            .map_err(db_error("query task"))?;

        match rows.next().await.map_err(db_error("read task"))? {
            Some(row) => Ok(Some(task_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_task_for_owner(
        &self,
        id: i64,
        owner_id: i64,
        text: &str,
    ) -> Result<Option<Task>> {
        let conn = self.connection().await?;
        let now = Utc::now().timestamp();

        let mut rows = conn
            .query(
                &format!(
                    "UPDATE tasks SET task = ?, updated_at = ?
                     WHERE id = ? AND user_id = ? RETURNING {TASK_COLUMNS}"
                ),
                (text, now, id, owner_id),
            )
            .await
            .map_err(db_error("update task"))?;

        match rows.next().await.map_err(db_error("update task"))? {
            Some(row) => Ok(Some(task_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_task_status_for_owner(
        &self,
        id: i64,
        owner_id: i64,
        status: bool,
    ) -> Result<Option<Task>> {
        let conn = self.connection().await?;
        let now = Utc::now().timestamp();

        let mut rows = conn
            .query(
                &format!(
                    "UPDATE tasks SET status = ?, updated_at = ?
                     WHERE id = ? AND user_id = ? RETURNING {TASK_COLUMNS}"
                ),
                (i64::from(status), now, id, owner_id),
            )
            .await
            .map_err(db_error("update task status"))?;

        match rows.next().await.map_err(db_error("update task status"))? {
            Some(row) => Ok(Some(task_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn delete_task_for_owner(&self, id: i64, owner_id: i64) -> Result<bool> {
        let conn = self.connection().await?;

        let affected = conn
            .execute(
                "DELETE FROM tasks WHERE id = ? AND user_id = ?",
                (id, owner_id),
            )
            .await
            .map_err(db_error("delete task"))?;

        Ok(affected > 0)
    }

    async fn task_exists(&self, id: i64) -> Result<bool> {
        let conn = self.connection().await?;

        let mut rows = conn
            .query("SELECT 1 FROM tasks WHERE id = ?", [id])
            .await
            .map_err(db_error("query task"))?;

        Ok(rows.next().await.map_err(db_error("read task"))?.is_some())
    }
}

async fn insert_user(conn: &Connection, user: &NewUser) -> Result<UserRecord> {
    let now = Utc::now().timestamp();

    let mut rows = conn
        .query(
            &format!(
                "INSERT INTO users (username, email, password_hash, role, created_at)
                 VALUES (?, ?, ?, ?, ?) RETURNING {USER_COLUMNS}"
            ),
            (
                user.username.as_str(),
                user.email.as_str(),
                user.password_hash.as_str(),
                user.role.as_str(),
                now,
            ),
        )
        .await
        .map_err(db_error("create user"))?;

    let row = rows
        .next()
        .await
        .map_err(db_error("create user"))?
        .ok_or_else(|| AppError::Database("User insert returned no row".to_string()))?;

    user_from_row(&row)
}

async fn insert_task(conn: &Connection, owner_id: i64, text: &str) -> Result<Task> {
    let now = Utc::now().timestamp();

    let mut rows = conn
        .query(
            &format!(
                "INSERT INTO tasks (user_id, task, status, created_at, updated_at)
                 VALUES (?, ?, 0, ?, ?) RETURNING {TASK_COLUMNS}"
            ),
            (owner_id, text, now, now),
        )
        .await
        .map_err(db_error("create task"))?;

    let row = rows
        .next()
        .await
        .map_err(db_error("create task"))?
        .ok_or_else(|| AppError::Database("Task insert returned no row".to_string()))?;

    task_from_row(&row)
}

/// Maps a libsql failure to the error taxonomy, keeping the detail for logs.
fn db_error(context: &'static str) -> impl Fn(libsql::Error) -> AppError {
    move |e| {
        let detail = e.to_string();
        if detail.contains("UNIQUE constraint failed: users.username") {
            AppError::Conflict("Username already taken".to_string())
        } else if detail.contains("CHECK constraint failed") {
            AppError::Validation(format!("Rejected by store: {}", context))
        } else if detail.contains("FOREIGN KEY constraint failed") {
            AppError::Conflict(format!("Referenced row does not exist ({})", context))
        } else {
            AppError::Database(format!("Failed to {}: {}", context, detail))
        }
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| AppError::Database(format!("Invalid stored timestamp {}", secs)))
}

fn task_from_row(row: &Row) -> Result<Task> {
    Ok(Task {
        id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
        owner_id: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
        task: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
        status: row
            .get::<i64>(3)
            .map_err(|e| AppError::Database(e.to_string()))?
            != 0,
        created_at: timestamp(row.get(4).map_err(|e| AppError::Database(e.to_string()))?)?,
        updated_at: timestamp(row.get(5).map_err(|e| AppError::Database(e.to_string()))?)?,
    })
}

fn user_from_row(row: &Row) -> Result<UserRecord> {
    let role: String = row.get(4).map_err(|e| AppError::Database(e.to_string()))?;

    Ok(UserRecord {
        id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
        username: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
        email: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
        password_hash: row.get(3).map_err(|e| AppError::Database(e.to_string()))?,
        role: role.parse()?,
        created_at: timestamp(row.get(5).map_err(|e| AppError::Database(e.to_string()))?)?,
    })
}

/// Account row as stored, including the password digest.
///
/// Not `Serialize`: responses go through [`UserProfile`].
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// Values for an account insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}
