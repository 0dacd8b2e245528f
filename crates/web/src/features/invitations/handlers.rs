use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Serialize;
use storage::{
    Database,
    dto::team::{InvitationResponse, RespondInvitationRequest},
    models::{Actor, TeamMember},
};
use utoipa::ToSchema;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[derive(Debug, Serialize, ToSchema)]
pub struct RespondInvitationResponse {
    pub invitation: InvitationResponse,
    /// Present when the answer added a member to the team
    pub member: Option<TeamMember>,
}

#[utoipa::path(
    get,
    path = "/api/invitations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending invitations addressed to the caller", body = Vec<InvitationResponse>)
    ),
    tag = "invitations"
)]
pub async fn list_incoming(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<InvitationResponse>>, WebError> {
    let invitations = services::list_incoming(db.pool(), &actor).await?;

    Ok(Json(invitations.into_iter().map(InvitationResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/invitations/{id}/respond",
    params(("id" = String, Path, description = "Invitation or request id")),
    request_body = RespondInvitationRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Invitation answered", body = RespondInvitationResponse),
        (status = 403, description = "Not the recipient"),
        (status = 409, description = "Team full or user already in a team"),
        (status = 422, description = "Invitation already answered")
    ),
    tag = "invitations"
)]
pub async fn respond(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<RespondInvitationRequest>,
) -> Result<Json<RespondInvitationResponse>, WebError> {
    let outcome = services::respond(&state, &actor, &id, req.accept).await?;

    Ok(Json(RespondInvitationResponse {
        invitation: outcome.invitation.into(),
        member: outcome.member,
    }))
}
