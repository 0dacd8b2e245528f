//! Competition lifecycle: creation, edits, status transitions, results.

use sqlx::PgPool;
use validator::Validate;

use super::policy::{Action, Resource, authorize};
use crate::dto::competition::{CreateCompetitionRequest, UpdateCompetitionRequest};
use crate::dto::result::RecordResultRequest;
use crate::error::{Result, StorageError};
use crate::models::{Actor, Competition, CompetitionResult, CompetitionStatus};
use crate::repository::{
    self, CompetitionRepository, ParticipantContact, ResultRepository, TeamRepository,
    UserRepository,
};

/// Platform rules applied when competitions are created
#[derive(Debug, Clone, Copy)]
pub struct LifecycleRules {
    /// Organizers may open registration directly, bypassing moderation
    pub allow_skip_moderation: bool,
}

impl Default for LifecycleRules {
    fn default() -> Self {
        Self {
            allow_skip_moderation: true,
        }
    }
}

/// A committed transition and the participants it cancelled
#[derive(Debug)]
pub struct TransitionOutcome {
    pub competition: Competition,
    pub cancelled: Vec<ParticipantContact>,
}

/// Status a new competition starts in
fn initial_status(
    actor: &Actor,
    rules: LifecycleRules,
    requested: Option<CompetitionStatus>,
) -> Result<CompetitionStatus> {
    let status = requested.unwrap_or(CompetitionStatus::Draft);

    if !status.is_initial() {
        return Err(StorageError::Validation(format!(
            "a competition cannot start in status {status}"
        )));
    }

    if status == CompetitionStatus::RegistrationOpen
        && !rules.allow_skip_moderation
        && !actor.is_admin()
    {
        return Err(StorageError::Forbidden(
            "competitions must go through moderation".to_string(),
        ));
    }

    Ok(status)
}

pub async fn create(
    pool: &PgPool,
    actor: &Actor,
    rules: LifecycleRules,
    req: &CreateCompetitionRequest,
) -> Result<Competition> {
    authorize(actor, Action::CreateCompetition, Resource::Platform)?;
    req.validate()
        .map_err(|e| StorageError::Validation(e.to_string()))?;
    req.schedule().validate()?;

    let status = initial_status(actor, rules, req.initial_status)?;

    let organizer_id = match req.organizer_id.as_deref() {
        Some(id) if !actor.is(id) => {
            if !actor.is_admin() {
                return Err(StorageError::Forbidden(
                    "only administrators may assign another organizer".to_string(),
                ));
            }
            let organizer = UserRepository::new(pool).find_by_id(id).await?;
            if !organizer.role.can_organize() {
                return Err(StorageError::Validation(
                    "assigned user cannot organize competitions".to_string(),
                ));
            }
            organizer.id
        }
        _ => actor.user_id.clone(),
    };

    let competition = CompetitionRepository::new(pool)
        .create(req, &organizer_id, status)
        .await?;

    tracing::info!(
        competition_id = %competition.id,
        organizer_id = %competition.organizer_id,
        status = %competition.status,
        "Competition created"
    );

    Ok(competition)
}

/// Partial update; never changes the status
pub async fn update(
    pool: &PgPool,
    actor: &Actor,
    competition_id: &str,
    req: &UpdateCompetitionRequest,
) -> Result<Competition> {
    let mut tx = pool.begin().await?;
    let existing = repository::competition::lock(&mut tx, competition_id).await?;

    authorize(
        actor,
        Action::ManageCompetition,
        Resource::Competition {
            organizer_id: &existing.organizer_id,
        },
    )?;

    if existing.status.is_terminal() {
        return Err(StorageError::InvalidState(format!(
            "competition is {}",
            existing.status
        )));
    }

    req.merged_schedule(&existing).validate()?;

    let max_participants = req.merged_max_participants(&existing);
    if let Some(max) = max_participants
        && max < existing.current_participants
    {
        return Err(StorageError::Conflict(format!(
            "max_participants ({max}) is below the {} participants already admitted",
            existing.current_participants
        )));
    }

    let competition =
        repository::competition::apply_update(&mut tx, competition_id, req, max_participants)
            .await?;
    tx.commit().await?;

    tracing::info!(competition_id = %competition.id, "Competition updated");
    Ok(competition)
}

/// Moves a competition along its lifecycle.
///
/// Cancelling also cancels every slot-holding registration in the same
/// transaction; the returned contacts are for notifying after commit.
pub async fn transition(
    pool: &PgPool,
    actor: &Actor,
    competition_id: &str,
    target: CompetitionStatus,
) -> Result<TransitionOutcome> {
    let mut tx = pool.begin().await?;
    let existing = repository::competition::lock(&mut tx, competition_id).await?;

    authorize(
        actor,
        Action::ManageCompetition,
        Resource::Competition {
            organizer_id: &existing.organizer_id,
        },
    )?;

    let target = existing.status.transition_to(target)?;
    let mut competition = repository::competition::set_status(&mut tx, competition_id, target).await?;

    let cancelled = if target == CompetitionStatus::Cancelled {
        let contacts =
            repository::registration::cancel_all_active(&mut tx, competition_id).await?;
        competition = repository::competition::reset_participants(&mut tx, competition_id).await?;
        contacts
    } else {
        Vec::new()
    };

    tx.commit().await?;

    tracing::info!(
        competition_id = %competition.id,
        from = %existing.status,
        to = %competition.status,
        cancelled_registrations = cancelled.len(),
        "Competition status changed"
    );

    Ok(TransitionOutcome {
        competition,
        cancelled,
    })
}

pub async fn delete(pool: &PgPool, actor: &Actor, competition_id: &str) -> Result<()> {
    let repo = CompetitionRepository::new(pool);
    let existing = repo.find_by_id(competition_id).await?;

    authorize(
        actor,
        Action::ManageCompetition,
        Resource::Competition {
            organizer_id: &existing.organizer_id,
        },
    )?;

    repo.delete(competition_id).await?;

    tracing::info!(competition_id, deleted_by = %actor.user_id, "Competition deleted");
    Ok(())
}

/// Records a placement once the competition is completed
pub async fn record_result(
    pool: &PgPool,
    actor: &Actor,
    competition_id: &str,
    req: &RecordResultRequest,
) -> Result<CompetitionResult> {
    let competition = CompetitionRepository::new(pool)
        .find_by_id(competition_id)
        .await?;

    authorize(
        actor,
        Action::RecordResults,
        Resource::Competition {
            organizer_id: &competition.organizer_id,
        },
    )?;

    req.validate()
        .map_err(|e| StorageError::Validation(e.to_string()))?;

    if competition.status != CompetitionStatus::Completed {
        return Err(StorageError::InvalidState(format!(
            "results can only be recorded for completed competitions, status is {}",
            competition.status
        )));
    }

    if let Some(team_id) = req.team_id.as_deref() {
        let team = TeamRepository::new(pool).find_by_id(team_id).await?;
        if team.competition_id != competition.id {
            return Err(StorageError::Validation(
                "team does not belong to this competition".to_string(),
            ));
        }
    }

    let result = ResultRepository::new(pool).create(competition_id, req).await?;

    tracing::info!(
        result_id = %result.id,
        competition_id,
        place = ?result.place,
        "Result recorded"
    );

    Ok(result)
}
