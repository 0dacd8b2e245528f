use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::user::{
        AchievementResponse, CreateAchievementRequest, CreatePortfolioItemRequest,
        PortfolioItemResponse, UpdateProfileRequest, UserProfileResponse, UserResponse,
    },
    models::Actor,
};
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User profile", body = UserProfileResponse),
        (status = 403, description = "Not your profile"),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn get_user(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<UserProfileResponse>, WebError> {
    let profile = services::get_profile(db.pool(), &actor, &id).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateProfileRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not your profile")
    ),
    tag = "users"
)]
pub async fn update_user(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let user = services::update_profile(db.pool(), &actor, &id, &req).await?;

    Ok(Json(UserResponse::from(user)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/portfolio",
    params(("id" = String, Path, description = "User id")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Portfolio items", body = Vec<PortfolioItemResponse>)),
    tag = "users"
)]
pub async fn list_portfolio(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PortfolioItemResponse>>, WebError> {
    let items = services::list_portfolio(db.pool(), &actor, &id).await?;

    Ok(Json(items.into_iter().map(PortfolioItemResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/portfolio",
    params(("id" = String, Path, description = "User id")),
    request_body = CreatePortfolioItemRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Portfolio item created", body = PortfolioItemResponse),
        (status = 400, description = "Validation error")
    ),
    tag = "users"
)]
pub async fn add_portfolio_item(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<CreatePortfolioItemRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let item = services::add_portfolio_item(db.pool(), &actor, &id, &req).await?;

    Ok((StatusCode::CREATED, Json(PortfolioItemResponse::from(item))).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/portfolio/{item_id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("item_id" = String, Path, description = "Portfolio item id")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Portfolio item deleted"),
        (status = 404, description = "Portfolio item not found")
    ),
    tag = "users"
)]
pub async fn delete_portfolio_item(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<StatusCode, WebError> {
    services::delete_portfolio_item(db.pool(), &actor, &id, &item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/achievements",
    params(("id" = String, Path, description = "User id")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Achievements", body = Vec<AchievementResponse>)),
    tag = "users"
)]
pub async fn list_achievements(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AchievementResponse>>, WebError> {
    let achievements = services::list_achievements(db.pool(), &id).await?;

    Ok(Json(
        achievements
            .into_iter()
            .map(AchievementResponse::from)
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/achievements",
    params(("id" = String, Path, description = "User id")),
    request_body = CreateAchievementRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Achievement awarded", body = AchievementResponse),
        (status = 403, description = "Administrators only")
    ),
    tag = "users"
)]
pub async fn award_achievement(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<CreateAchievementRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let achievement = services::award_achievement(db.pool(), &actor, &id, &req).await?;

    Ok((StatusCode::CREATED, Json(AchievementResponse::from(achievement))).into_response())
}
