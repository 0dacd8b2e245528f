use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::team::{
        AddMemberRequest, CreateTeamRequest, InvitationResponse, TeamDetailResponse, TeamFilter,
        TeamListItem, TeamResponse, UpdateTeamStatusRequest,
    },
    models::{Actor, TeamMember},
};
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/teams",
    params(TeamFilter),
    responses(
        (status = 200, description = "Teams with member counts", body = Vec<TeamListItem>)
    ),
    tag = "teams"
)]
pub async fn list_teams(
    State(db): State<Database>,
    Query(filter): Query<TeamFilter>,
) -> Result<Json<Vec<TeamListItem>>, WebError> {
    let teams = services::list_teams(db.pool(), &filter).await?;

    Ok(Json(teams))
}

#[utoipa::path(
    get,
    path = "/api/teams/{id}",
    params(("id" = String, Path, description = "Team id")),
    responses(
        (status = 200, description = "Team with members", body = TeamDetailResponse),
        (status = 404, description = "Team not found")
    ),
    tag = "teams"
)]
pub async fn get_team(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Json<TeamDetailResponse>, WebError> {
    let team = services::get_team(db.pool(), &id).await?;

    Ok(Json(team))
}

#[utoipa::path(
    post,
    path = "/api/teams",
    request_body = CreateTeamRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Team created with its captain", body = TeamResponse),
        (status = 409, description = "Captain already has a team in this competition"),
        (status = 422, description = "Competition no longer accepts teams")
    ),
    tag = "teams"
)]
pub async fn create_team(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateTeamRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let team = services::create_team(&state, &actor, &req).await?;

    Ok((StatusCode::CREATED, Json(TeamResponse::from(team))).into_response())
}

#[utoipa::path(
    post,
    path = "/api/teams/{id}/members",
    params(("id" = String, Path, description = "Team id")),
    request_body = AddMemberRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Member added", body = TeamMember),
        (status = 403, description = "Not the captain or organizer"),
        (status = 409, description = "Team full or user already in a team")
    ),
    tag = "teams"
)]
pub async fn add_member(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let member = services::add_member(&state, &actor, &id, &req.user_id).await?;

    Ok((StatusCode::CREATED, Json(member)).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/teams/{id}/members/{user_id}",
    params(
        ("id" = String, Path, description = "Team id"),
        ("user_id" = String, Path, description = "Member to remove")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Member removed"),
        (status = 403, description = "Not allowed to remove this member"),
        (status = 422, description = "The captain cannot leave the team")
    ),
    tag = "teams"
)]
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, WebError> {
    services::remove_member(&state, &actor, &id, &user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/teams/{id}",
    params(("id" = String, Path, description = "Team id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Team disbanded"),
        (status = 403, description = "Not the captain or organizer"),
        (status = 404, description = "Team not found")
    ),
    tag = "teams"
)]
pub async fn disband_team(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<StatusCode, WebError> {
    services::disband(db.pool(), &actor, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/teams/{id}/status",
    params(("id" = String, Path, description = "Team id")),
    request_body = UpdateTeamStatusRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Team reviewed", body = TeamResponse),
        (status = 403, description = "Not the organizer"),
        (status = 422, description = "Transition not allowed")
    ),
    tag = "teams"
)]
pub async fn update_status(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTeamStatusRequest>,
) -> Result<Json<TeamResponse>, WebError> {
    let team = services::set_status(db.pool(), &actor, &id, req.status).await?;

    Ok(Json(team.into()))
}

#[utoipa::path(
    post,
    path = "/api/teams/{id}/invitations",
    params(("id" = String, Path, description = "Team id")),
    request_body = AddMemberRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Invitation sent", body = InvitationResponse),
        (status = 403, description = "Not the captain or organizer"),
        (status = 409, description = "Team full or invitation already pending")
    ),
    tag = "teams"
)]
pub async fn invite(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let invitation = services::invite(&state, &actor, &id, &req.user_id).await?;

    Ok((StatusCode::CREATED, Json(InvitationResponse::from(invitation))).into_response())
}

#[utoipa::path(
    post,
    path = "/api/teams/{id}/requests",
    params(("id" = String, Path, description = "Team id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Join request sent", body = InvitationResponse),
        (status = 409, description = "Team full, already in a team or request pending")
    ),
    tag = "teams"
)]
pub async fn request_to_join(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Response, WebError> {
    let request = services::request_to_join(&state, &actor, &id).await?;

    Ok((StatusCode::CREATED, Json(InvitationResponse::from(request))).into_response())
}

#[utoipa::path(
    get,
    path = "/api/teams/{id}/invitations",
    params(("id" = String, Path, description = "Team id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Invitations and requests of the team", body = Vec<InvitationResponse>),
        (status = 403, description = "Not the captain or organizer")
    ),
    tag = "teams"
)]
pub async fn list_invitations(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<Vec<InvitationResponse>>, WebError> {
    let invitations = services::list_invitations(db.pool(), &actor, &id).await?;

    Ok(Json(invitations.into_iter().map(InvitationResponse::from).collect()))
}
