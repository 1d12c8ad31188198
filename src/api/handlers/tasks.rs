//! Task handlers.
//!
//! Every route here sits behind the auth middleware; the caller's identity
//! arrives through [`AuthUser`] and is passed down explicitly.

use crate::{
    AppState,
    auth::middleware::AuthUser,
    types::{
        BulkCreateTasksRequest, CreateTaskRequest, MessageResponse, Result, StatusResponse, Task,
        UpdateStatusRequest, UpdateTaskRequest,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// List the caller's tasks.
#[utoipa::path(
    get,
    path = "/tasks",
    responses(
        (status = 200, description = "Tasks owned by the caller", body = Vec<Task>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "tasks",
    security(("bearer" = []))
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<Task>>> {
    Ok(Json(state.tasks.list(&identity).await?))
}

/// Create a task owned by the caller.
#[utoipa::path(
    post,
    path = "/task",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Invalid task text"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "tasks",
    security(("bearer" = []))
)]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>)> {
    let task = state.tasks.create(&identity, &payload.task).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Create several tasks at once. Either all are created or none.
#[utoipa::path(
    post,
    path = "/tasks/bulk",
    request_body = BulkCreateTasksRequest,
    responses(
        (status = 201, description = "Tasks created", body = Vec<Task>),
        (status = 400, description = "Empty batch or invalid task text"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "tasks",
    security(("bearer" = []))
)]
pub async fn create_tasks_bulk(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<BulkCreateTasksRequest>,
) -> Result<(StatusCode, Json<Vec<Task>>)> {
    let tasks = state.tasks.create_bulk(&identity, &payload.tasks).await?;
    Ok((StatusCode::CREATED, Json(tasks)))
}

/// Get one of the caller's tasks.
#[utoipa::path(
    get,
    path = "/tasks/{id}",
    params(("id" = i64, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task found", body = Task),
        (status = 403, description = "Task belongs to another user"),
        (status = 404, description = "Task not found")
    ),
    tag = "tasks",
    security(("bearer" = []))
)]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Task>> {
    Ok(Json(state.tasks.get(&identity, id).await?))
}

/// Replace the text of one of the caller's tasks.
#[utoipa::path(
    put,
    path = "/tasks/{id}",
    params(("id" = i64, Path, description = "Task ID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "Invalid task text"),
        (status = 403, description = "Task belongs to another user"),
        (status = 404, description = "Task not found")
    ),
    tag = "tasks",
    security(("bearer" = []))
)]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<Task>> {
    Ok(Json(state.tasks.update(&identity, id, &payload.task).await?))
}

#[utoipa::path(
    patch,
    path = "/tasks/{id}/status",
    params(("id" = i64, Path, description = "Task ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = StatusResponse),
        (status = 403, description = "Task belongs to another user"),
        (status = 404, description = "Task not found")
    ),
    tag = "tasks",
    security(("bearer" = []))
)]
pub async fn update_task_status(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<StatusResponse>> {
    let task = state.tasks.set_status(&identity, id, payload.status).await?;
    Ok(Json(StatusResponse {
        id: task.id,
        status: task.status,
    }))
}

#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    params(("id" = i64, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 403, description = "Task belongs to another user"),
        (status = 404, description = "Task not found")
    ),
    tag = "tasks",
    security(("bearer" = []))
)]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    state.tasks.delete(&identity, id).await?;
    Ok(Json(MessageResponse {
        message: format!("Task {} deleted", id),
    }))
}
