use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::common::{Page, PageParams},
    dto::user::{
        AdminCreateUserRequest, AdminCreateUserResponse, AdminUpdateUserRequest, UserFilter,
        UserResponse,
    },
    models::Actor,
};
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(UserFilter, PageParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users page", body = Page<UserResponse>),
        (status = 403, description = "Administrators only")
    ),
    tag = "admin"
)]
pub async fn list_users(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<UserFilter>,
    Query(page): Query<PageParams>,
) -> Result<Json<Page<UserResponse>>, WebError> {
    let (users, total) = services::list_users(db.pool(), &actor, &filter, page).await?;

    Ok(Json(Page::new(
        users.into_iter().map(UserResponse::from).collect(),
        page,
        total,
    )))
}

#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = AdminCreateUserRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "User created", body = AdminCreateUserResponse),
        (status = 409, description = "Email already in use")
    ),
    tag = "admin"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<AdminCreateUserRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let (user, temporary_password) = services::create_user(&state, &actor, &req).await?;

    Ok((
        StatusCode::CREATED,
        Json(AdminCreateUserResponse {
            user: user.into(),
            temporary_password,
        }),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    params(("id" = String, Path, description = "User id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found")
    ),
    tag = "admin"
)]
pub async fn get_user(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, WebError> {
    let user = services::get_user(db.pool(), &actor, &id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = AdminUpdateUserRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already in use")
    ),
    tag = "admin"
)]
pub async fn update_user(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<AdminUpdateUserRequest>,
) -> Result<Json<UserResponse>, WebError> {
    req.validate()?;

    let user = services::update_user(db.pool(), &actor, &id, &req).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = String, Path, description = "User id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found")
    ),
    tag = "admin"
)]
pub async fn delete_user(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<StatusCode, WebError> {
    services::delete_user(db.pool(), &actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
