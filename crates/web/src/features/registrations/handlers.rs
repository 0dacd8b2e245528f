use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::registration::{
        CreateRegistrationRequest, RegistrationCheckQuery, RegistrationCheckResponse,
        RegistrationDetail, RegistrationFilter, RegistrationResponse,
        UpdateRegistrationStatusRequest,
    },
    models::Actor,
};
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    post,
    path = "/api/registrations",
    request_body = CreateRegistrationRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Registration created", body = RegistrationResponse),
        (status = 404, description = "Competition or user not found"),
        (status = 409, description = "Already registered or capacity exceeded"),
        (status = 422, description = "Registration is closed")
    ),
    tag = "registrations"
)]
pub async fn create_registration(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateRegistrationRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let registration = services::register(db.pool(), &actor, &req).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse::from(registration)),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/registrations",
    params(RegistrationFilter),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Registrations visible to the caller", body = Vec<RegistrationDetail>)
    ),
    tag = "registrations"
)]
pub async fn list_registrations(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<RegistrationFilter>,
) -> Result<Json<Vec<RegistrationDetail>>, WebError> {
    let registrations = services::list_registrations(db.pool(), &actor, &filter).await?;

    Ok(Json(registrations))
}

#[utoipa::path(
    get,
    path = "/api/registrations/check",
    params(RegistrationCheckQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Whether the caller holds an active registration", body = RegistrationCheckResponse),
        (status = 400, description = "competition_id is missing")
    ),
    tag = "registrations"
)]
pub async fn check_registration(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<RegistrationCheckQuery>,
) -> Result<Json<RegistrationCheckResponse>, WebError> {
    if query.competition_id.trim().is_empty() {
        return Err(WebError::BadRequest("competition_id is required".to_string()));
    }

    let is_registered = services::is_registered(db.pool(), &actor, &query.competition_id).await?;

    Ok(Json(RegistrationCheckResponse { is_registered }))
}

#[utoipa::path(
    get,
    path = "/api/registrations/{id}",
    params(("id" = String, Path, description = "Registration id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Registration found", body = RegistrationDetail),
        (status = 403, description = "Not the participant or organizer"),
        (status = 404, description = "Registration not found")
    ),
    tag = "registrations"
)]
pub async fn get_registration(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<RegistrationDetail>, WebError> {
    let registration = services::get_registration(db.pool(), &actor, &id).await?;

    Ok(Json(registration))
}

#[utoipa::path(
    put,
    path = "/api/registrations/{id}/status",
    params(("id" = String, Path, description = "Registration id")),
    request_body = UpdateRegistrationStatusRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Status updated", body = RegistrationResponse),
        (status = 403, description = "Not the organizer"),
        (status = 422, description = "Transition not allowed")
    ),
    tag = "registrations"
)]
pub async fn update_status(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRegistrationStatusRequest>,
) -> Result<Json<RegistrationResponse>, WebError> {
    let registration = services::set_status(db.pool(), &actor, &id, &req).await?;

    Ok(Json(registration.into()))
}

#[utoipa::path(
    post,
    path = "/api/registrations/{id}/cancel",
    params(("id" = String, Path, description = "Registration id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Registration cancelled", body = RegistrationResponse),
        (status = 403, description = "Not the participant or organizer"),
        (status = 422, description = "Already cancelled")
    ),
    tag = "registrations"
)]
pub async fn cancel_registration(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<RegistrationResponse>, WebError> {
    let registration = services::cancel(db.pool(), &actor, &id).await?;

    Ok(Json(registration.into()))
}

#[utoipa::path(
    delete,
    path = "/api/registrations/{id}",
    params(("id" = String, Path, description = "Registration id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Registration deleted"),
        (status = 403, description = "Administrators only"),
        (status = 404, description = "Registration not found")
    ),
    tag = "registrations"
)]
pub async fn delete_registration(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<StatusCode, WebError> {
    services::delete_registration(db.pool(), &actor, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}
