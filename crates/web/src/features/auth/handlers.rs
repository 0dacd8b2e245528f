use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::dto::user::{
    LoginRequest, LoginResponse, RegisterUserRequest, UserResponse, VerifyEmailRequest,
};
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Account created, verification code sent", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Role cannot be self-assigned"),
        (status = 409, description = "Email already in use")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let user = services::register(&state, &req).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))).into_response())
}

#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = UserResponse),
        (status = 400, description = "Invalid code")
    ),
    tag = "auth"
)]
pub async fn verify_email(
    State(state): State<AppState>,
    Json(req): Json<VerifyEmailRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let user = services::verify_email(&state, &req).await?;

    Ok(Json(UserResponse::from(user)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account blocked")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let (token, user) = services::login(&state, &req).await?;

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    })
    .into_response())
}
