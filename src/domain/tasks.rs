use crate::db::DatabaseClient;
use crate::domain::{MAX_BULK_TASKS, validate_task_text};
use crate::policy;
use crate::types::{AppError, Identity, Result, Task};
use std::sync::Arc;

/// Task operations for the calling identity.
///
/// Every read and write is scoped to `identity.user_id` inside the store
/// statement itself. A statement that matches nothing is resolved by
/// [`policy::ownership_miss`].
#[derive(Clone)]
pub struct TaskService {
    db: Arc<dyn DatabaseClient>,
}

impl TaskService {
    pub fn new(db: Arc<dyn DatabaseClient>) -> Self {
        Self { db }
    }

    pub async fn list(&self, identity: &Identity) -> Result<Vec<Task>> {
        let tasks = self.db.list_tasks_by_owner(identity.user_id).await?;
        tracing::debug!(user_id = identity.user_id, count = tasks.len(), "listed tasks");
        Ok(tasks)
    }

    pub async fn get(&self, identity: &Identity, task_id: i64) -> Result<Task> {
        match self.db.get_task_for_owner(task_id, identity.user_id).await? {
            Some(task) => Ok(task),
            None => Err(self.miss(identity, task_id).await),
        }
    }

    /// Creates a task owned by the caller.
    pub async fn create(&self, identity: &Identity, text: &str) -> Result<Task> {
        let text = validate_task_text(text)?;

        let task = self.db.create_task(identity.user_id, &text).await?;
        tracing::info!(user_id = identity.user_id, task_id = task.id, "created task");

        Ok(task)
    }

    /// Creates all tasks or none. The whole batch is validated up front, and
    /// the store discards every insert if any one of them fails.
    pub async fn create_bulk(&self, identity: &Identity, texts: &[String]) -> Result<Vec<Task>> {
        if texts.is_empty() {
            return Err(AppError::Validation(
                "At least one task is required".to_string(),
            ));
        }
        if texts.len() > MAX_BULK_TASKS {
            return Err(AppError::Validation(format!(
                "At most {} tasks can be created at once",
                MAX_BULK_TASKS
            )));
        }

        let texts = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                validate_task_text(text).map_err(|e| match e {
                    AppError::Validation(msg) => AppError::Validation(format!("tasks[{}]: {}", i, msg)),
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let tasks = self.db.create_tasks_in_bulk(identity.user_id, &texts).await?;
        tracing::info!(user_id = identity.user_id, count = tasks.len(), "created tasks in bulk");

        Ok(tasks)
    }

    pub async fn update(&self, identity: &Identity, task_id: i64, text: &str) -> Result<Task> {
        let text = validate_task_text(text)?;

        match self
            .db
            .update_task_for_owner(task_id, identity.user_id, &text)
            .await?
        {
            Some(task) => {
                tracing::info!(user_id = identity.user_id, task_id, "updated task");
                Ok(task)
            }
            None => Err(self.miss(identity, task_id).await),
        }
    }

    pub async fn set_status(&self, identity: &Identity, task_id: i64, status: bool) -> Result<Task> {
        match self
            .db
            .update_task_status_for_owner(task_id, identity.user_id, status)
            .await?
        {
            Some(task) => {
                tracing::info!(user_id = identity.user_id, task_id, status, "updated task status");
                Ok(task)
            }
            None => Err(self.miss(identity, task_id).await),
        }
    }

    pub async fn delete(&self, identity: &Identity, task_id: i64) -> Result<()> {
        if self
            .db
            .delete_task_for_owner(task_id, identity.user_id)
            .await?
        {
            tracing::info!(user_id = identity.user_id, task_id, "deleted task");
            Ok(())
        } else {
            Err(self.miss(identity, task_id).await)
        }
    }

    async fn miss(&self, identity: &Identity, task_id: i64) -> AppError {
        match self.db.task_exists(task_id).await {
            Ok(exists) => policy::ownership_miss(identity, task_id, exists),
            Err(e) => e,
        }
    }
}
