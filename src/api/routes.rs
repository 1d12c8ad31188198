use crate::AppState;
use crate::auth::jwt::AuthService;
use crate::auth::middleware::{auth_middleware, require_admin};
use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;

pub fn create_router(auth_service: Arc<AuthService>) -> Router<AppState> {
    let public_routes = Router::new()
        // Public routes (no auth required)
        .route("/register", post(crate::api::handlers::auth::register))
        .route("/login", post(crate::api::handlers::auth::login))
        .route("/api-docs/openapi.json", get(crate::api::docs::openapi_json));

    let protected_routes = Router::new()
        // Protected routes (auth required)
        .route("/tasks", get(crate::api::handlers::tasks::list_tasks))
        .route("/task", post(crate::api::handlers::tasks::create_task))
        .route(
            "/tasks/bulk",
            post(crate::api::handlers::tasks::create_tasks_bulk),
        )
        .route(
            "/tasks/{id}",
            get(crate::api::handlers::tasks::get_task)
                .put(crate::api::handlers::tasks::update_task)
                .delete(crate::api::handlers::tasks::delete_task),
        )
        .route(
            "/tasks/{id}/status",
            patch(crate::api::handlers::tasks::update_task_status),
        )
        // Admin routes
        .route(
            "/admin/users",
            get(crate::api::handlers::users::list_users)
                .route_layer(middleware::from_fn(require_admin)),
        )
        // Self-deletion is refused before the role check, so this route
        // leaves the admin gate to the user service.
        .route(
            "/admin/user/{id}",
            delete(crate::api::handlers::users::delete_user),
        )
        .layer(middleware::from_fn(move |req, next| {
            auth_middleware(auth_service.clone(), req, next)
        }));

    public_routes.merge(protected_routes)
}
