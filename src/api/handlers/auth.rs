use crate::{
    AppState,
    types::{LoginRequest, RegisterRequest, RegisterResponse, Result, TokenResponse},
};
use axum::{Json, extract::State, http::StatusCode};

/// Register a new user
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = RegisterResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username already taken")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let registered = state.users.register(payload).await?;
    Ok((StatusCode::CREATED, Json(registered)))
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let tokens = state
        .users
        .login(&payload.username, &payload.password)
        .await?;
    Ok(Json(tokens))
}
