use sqlx::PgPool;
use storage::{
    dto::common::PageParams,
    dto::competition::{
        CompetitionDetailResponse, CompetitionFilter, CompetitionListItem,
        CreateCompetitionRequest, UpdateCompetitionRequest,
    },
    dto::registration::{RegistrationDetail, RegistrationFilter},
    dto::result::RecordResultRequest,
    error::Result,
    models::{Actor, Competition, CompetitionResult, CompetitionStatus},
    repository::{CompetitionRepository, RegistrationRepository, RegistrationScope, ResultRepository},
    services::lifecycle,
    services::policy::{Action, Resource, authorize},
};

use crate::notifications::notify_best_effort;
use crate::state::AppState;

pub async fn list_competitions(
    pool: &PgPool,
    filter: &CompetitionFilter,
    page: PageParams,
) -> Result<(Vec<CompetitionListItem>, i64)> {
    page.validate()?;
    CompetitionRepository::new(pool).list(filter, page).await
}

pub async fn get_competition(pool: &PgPool, id: &str) -> Result<CompetitionDetailResponse> {
    CompetitionRepository::new(pool).find_detail(id).await
}

pub async fn create_competition(
    state: &AppState,
    actor: &Actor,
    request: &CreateCompetitionRequest,
) -> Result<Competition> {
    lifecycle::create(state.db.pool(), actor, state.lifecycle_rules, request).await
}

pub async fn update_competition(
    pool: &PgPool,
    actor: &Actor,
    id: &str,
    request: &UpdateCompetitionRequest,
) -> Result<Competition> {
    lifecycle::update(pool, actor, id, request).await
}

/// Applies the transition, then tells every participant whose
/// registration was cancelled along with the competition
pub async fn transition_competition(
    state: &AppState,
    actor: &Actor,
    id: &str,
    target: CompetitionStatus,
) -> Result<Competition> {
    let outcome = lifecycle::transition(state.db.pool(), actor, id, target).await?;

    for participant in &outcome.cancelled {
        notify_best_effort(
            state.notifier.as_ref(),
            &participant.email,
            "Competition cancelled",
            &format!(
                "Hello {}, the competition \"{}\" was cancelled and your registration {} has been cancelled.",
                participant.name, outcome.competition.title, participant.registration_id
            ),
        )
        .await;
    }

    Ok(outcome.competition)
}

pub async fn delete_competition(pool: &PgPool, actor: &Actor, id: &str) -> Result<()> {
    lifecycle::delete(pool, actor, id).await
}

pub async fn list_results(pool: &PgPool, id: &str) -> Result<Vec<CompetitionResult>> {
    CompetitionRepository::new(pool).find_by_id(id).await?;
    ResultRepository::new(pool).list(id).await
}

pub async fn record_result(
    pool: &PgPool,
    actor: &Actor,
    id: &str,
    request: &RecordResultRequest,
) -> Result<CompetitionResult> {
    lifecycle::record_result(pool, actor, id, request).await
}

/// Registrations of one competition, for its organizer
pub async fn list_registrations(
    pool: &PgPool,
    actor: &Actor,
    id: &str,
    filter: RegistrationFilter,
) -> Result<Vec<RegistrationDetail>> {
    let competition = CompetitionRepository::new(pool).find_by_id(id).await?;
    authorize(
        actor,
        Action::ViewCompetitionRegistrations,
        Resource::Competition {
            organizer_id: &competition.organizer_id,
        },
    )?;

    let filter = RegistrationFilter {
        competition_id: Some(competition.id),
        ..filter
    };
    RegistrationRepository::new(pool)
        .list(&filter, RegistrationScope::Everything)
        .await
}
