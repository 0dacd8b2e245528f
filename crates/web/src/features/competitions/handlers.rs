use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::common::{Page, PageParams},
    dto::competition::{
        CompetitionDetailResponse, CompetitionFilter, CompetitionListItem, CompetitionResponse,
        CreateCompetitionRequest, TransitionRequest, UpdateCompetitionRequest,
    },
    dto::registration::{RegistrationDetail, RegistrationFilter},
    dto::result::{RecordResultRequest, ResultResponse},
    models::Actor,
};
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/competitions",
    params(CompetitionFilter, PageParams),
    responses(
        (status = 200, description = "Competitions ordered by event start", body = Page<CompetitionListItem>)
    ),
    tag = "competitions"
)]
pub async fn list_competitions(
    State(db): State<Database>,
    Query(filter): Query<CompetitionFilter>,
    Query(page): Query<PageParams>,
) -> Result<Json<Page<CompetitionListItem>>, WebError> {
    let (items, total) = services::list_competitions(db.pool(), &filter, page).await?;

    Ok(Json(Page::new(items, page, total)))
}

#[utoipa::path(
    get,
    path = "/api/competitions/{id}",
    params(("id" = String, Path, description = "Competition id")),
    responses(
        (status = 200, description = "Competition with organizer and teams", body = CompetitionDetailResponse),
        (status = 404, description = "Competition not found")
    ),
    tag = "competitions"
)]
pub async fn get_competition(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Response, WebError> {
    let competition = services::get_competition(db.pool(), &id).await?;

    Ok(Json(competition).into_response())
}

#[utoipa::path(
    post,
    path = "/api/competitions",
    request_body = CreateCompetitionRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Competition created successfully", body = CompetitionResponse),
        (status = 400, description = "Validation error or dates out of order"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only organizers create competitions")
    ),
    tag = "competitions"
)]
pub async fn create_competition(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateCompetitionRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let competition = services::create_competition(&state, &actor, &req).await?;

    Ok((StatusCode::CREATED, Json(CompetitionResponse::from(competition))).into_response())
}

#[utoipa::path(
    put,
    path = "/api/competitions/{id}",
    params(("id" = String, Path, description = "Competition id")),
    request_body = UpdateCompetitionRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Competition updated successfully", body = CompetitionResponse),
        (status = 400, description = "Validation error or dates out of order"),
        (status = 403, description = "Not the organizer"),
        (status = 404, description = "Competition not found"),
        (status = 409, description = "Capacity below admitted participants"),
        (status = 422, description = "Competition is completed or cancelled")
    ),
    tag = "competitions"
)]
pub async fn update_competition(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCompetitionRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let competition = services::update_competition(db.pool(), &actor, &id, &req).await?;

    Ok(Json(CompetitionResponse::from(competition)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/competitions/{id}/transition",
    params(("id" = String, Path, description = "Competition id")),
    request_body = TransitionRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Status changed", body = CompetitionResponse),
        (status = 403, description = "Not the organizer"),
        (status = 422, description = "Transition not allowed from the current status")
    ),
    tag = "competitions"
)]
pub async fn transition_competition(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<TransitionRequest>,
) -> Result<Response, WebError> {
    let competition = services::transition_competition(&state, &actor, &id, req.status).await?;

    Ok(Json(CompetitionResponse::from(competition)).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/competitions/{id}",
    params(("id" = String, Path, description = "Competition id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Competition deleted successfully"),
        (status = 403, description = "Not the organizer"),
        (status = 404, description = "Competition not found")
    ),
    tag = "competitions"
)]
pub async fn delete_competition(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<StatusCode, WebError> {
    services::delete_competition(db.pool(), &actor, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/competitions/{id}/results",
    params(("id" = String, Path, description = "Competition id")),
    responses(
        (status = 200, description = "Results by place", body = Vec<ResultResponse>),
        (status = 404, description = "Competition not found")
    ),
    tag = "competitions"
)]
pub async fn list_results(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ResultResponse>>, WebError> {
    let results = services::list_results(db.pool(), &id).await?;

    Ok(Json(results.into_iter().map(ResultResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/competitions/{id}/results",
    params(("id" = String, Path, description = "Competition id")),
    request_body = RecordResultRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Result recorded", body = ResultResponse),
        (status = 400, description = "Exactly one of user_id or team_id is required"),
        (status = 422, description = "Competition is not completed")
    ),
    tag = "competitions"
)]
pub async fn record_result(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<RecordResultRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let result = services::record_result(db.pool(), &actor, &id, &req).await?;

    Ok((StatusCode::CREATED, Json(ResultResponse::from(result))).into_response())
}

#[utoipa::path(
    get,
    path = "/api/competitions/{id}/registrations",
    params(("id" = String, Path, description = "Competition id"), RegistrationFilter),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Registrations of the competition", body = Vec<RegistrationDetail>),
        (status = 403, description = "Not the organizer")
    ),
    tag = "competitions"
)]
pub async fn list_registrations(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Query(filter): Query<RegistrationFilter>,
) -> Result<Json<Vec<RegistrationDetail>>, WebError> {
    let registrations = services::list_registrations(db.pool(), &actor, &id, filter).await?;

    Ok(Json(registrations))
}
