use axum::{
    Extension, Json,
    extract::{Query, State},
};
use storage::{
    Database,
    dto::common::{Page, PageParams},
    dto::competition::CompetitionListItem,
    dto::organizer::{OrganizerScope, OrganizerStats},
    dto::registration::RegistrationDetail,
    models::Actor,
};

use crate::error::WebError;

use super::services;

#[utoipa::path(
    get,
    path = "/api/organizer/stats",
    params(OrganizerScope),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard counters and recent registrations", body = OrganizerStats),
        (status = 403, description = "Organizers and administrators only")
    ),
    tag = "organizer"
)]
pub async fn stats(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Query(scope): Query<OrganizerScope>,
) -> Result<Json<OrganizerStats>, WebError> {
    let stats = services::stats(db.pool(), &actor, &scope).await?;

    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/organizer/competitions",
    params(OrganizerScope, PageParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Competitions owned by the organizer", body = Page<CompetitionListItem>),
        (status = 403, description = "Organizers and administrators only")
    ),
    tag = "organizer"
)]
pub async fn competitions(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Query(scope): Query<OrganizerScope>,
    Query(page): Query<PageParams>,
) -> Result<Json<Page<CompetitionListItem>>, WebError> {
    let (items, total) = services::competitions(db.pool(), &actor, &scope, page).await?;

    Ok(Json(Page::new(items, page, total)))
}

#[utoipa::path(
    get,
    path = "/api/organizer/registrations",
    params(OrganizerScope),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Registrations across the organizer's competitions", body = Vec<RegistrationDetail>),
        (status = 403, description = "Organizers and administrators only")
    ),
    tag = "organizer"
)]
pub async fn registrations(
    State(db): State<Database>,
    Extension(actor): Extension<Actor>,
    Query(scope): Query<OrganizerScope>,
) -> Result<Json<Vec<RegistrationDetail>>, WebError> {
    let registrations = services::registrations(db.pool(), &actor, &scope).await?;

    Ok(Json(registrations))
}
