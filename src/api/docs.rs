use crate::api::handlers::{auth, tasks, users};
use crate::types::{
    BulkCreateTasksRequest, CreateTaskRequest, LoginRequest, MessageResponse, RegisterRequest,
    RegisterResponse, Role, StatusResponse, Task, TokenResponse, UpdateStatusRequest,
    UpdateTaskRequest, UserProfile,
};
use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI document for the REST surface.
#[derive(OpenApi)]
#[openapi(
    info(title = "Taskgate API", description = "Multi-user task management"),
    paths(
        auth::register,
        auth::login,
        tasks::list_tasks,
        tasks::create_task,
        tasks::create_tasks_bulk,
        tasks::get_task,
        tasks::update_task,
        tasks::update_task_status,
        tasks::delete_task,
        users::list_users,
        users::delete_user,
    ),
    components(schemas(
        Role,
        Task,
        CreateTaskRequest,
        BulkCreateTasksRequest,
        UpdateTaskRequest,
        UpdateStatusRequest,
        StatusResponse,
        UserProfile,
        RegisterRequest,
        RegisterResponse,
        LoginRequest,
        TokenResponse,
        MessageResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "tasks", description = "Tasks owned by the caller"),
        (name = "admin", description = "Account administration"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme the protected paths refer to.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// GET /api-docs/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
