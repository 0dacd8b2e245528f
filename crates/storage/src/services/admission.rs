//! Admission of participants into a competition.
//!
//! Every mutation runs in one transaction that first locks the competition
//! row, so the participant counter always equals the number of
//! registrations holding a slot.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::policy::{Action, Resource, authorize};
use crate::dto::registration::{CreateRegistrationRequest, UpdateRegistrationStatusRequest};
use crate::error::{Result, StorageError};
use crate::models::{Actor, Registration, RegistrationStatus};
use crate::repository::{self, RegistrationRepository};

/// Admits a user into a competition and takes one participant slot.
///
/// Failure modes, in the order they are checked: `NotFound` for a missing
/// competition or user, `RegistrationClosed` when status or window forbid
/// it, `Validation` for a foreign team, then `AlreadyRegistered` and
/// `CapacityExceeded` as conflicts.
pub async fn register(
    pool: &PgPool,
    actor: &Actor,
    req: &CreateRegistrationRequest,
    now: DateTime<Utc>,
) -> Result<Registration> {
    let user_id = participant_id(actor, req);
    authorize(actor, Action::RegisterParticipant, Resource::User { user_id })?;

    let mut tx = pool.begin().await?;

    let competition = repository::competition::lock(&mut tx, &req.competition_id).await?;
    repository::user::ensure_exists(&mut tx, user_id).await?;

    // Closed beats everything else, an existing registration beats a full house
    competition.check_registration_open(now)?;

    if let Some(team_id) = req.team_id.as_deref() {
        match repository::team::find_membership(&mut tx, &competition.id, user_id).await? {
            Some(member) if member.team_id == team_id => {}
            _ => {
                return Err(StorageError::Validation(
                    "user is not a member of this team in this competition".to_string(),
                ));
            }
        }
    }

    if repository::registration::find_active(&mut tx, user_id, &competition.id)
        .await?
        .is_some()
    {
        return Err(StorageError::AlreadyRegistered);
    }

    competition.check_admission(now)?;

    let Some(updated) = repository::competition::claim_slot(&mut tx, &competition.id).await?
    else {
        return Err(StorageError::CapacityExceeded);
    };

    let registration = repository::registration::insert(
        &mut tx,
        &competition.id,
        user_id,
        req.team_id.as_deref(),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        registration_id = %registration.id,
        competition_id = %registration.competition_id,
        user_id = %registration.user_id,
        current_participants = updated.current_participants,
        "Registration created"
    );

    Ok(registration)
}

/// Cancels a registration and releases its slot when it held one
pub async fn cancel(pool: &PgPool, actor: &Actor, registration_id: &str) -> Result<Registration> {
    let competition_id = RegistrationRepository::new(pool)
        .find_by_id(registration_id)
        .await?
        .competition_id;

    let mut tx = pool.begin().await?;
    let competition = repository::competition::lock(&mut tx, &competition_id).await?;
    let current = repository::registration::lock(&mut tx, registration_id).await?;

    authorize(
        actor,
        Action::CancelRegistration,
        Resource::Registration {
            owner_id: &current.user_id,
            organizer_id: &competition.organizer_id,
        },
    )?;

    let target = current.status.transition_to(RegistrationStatus::Cancelled)?;
    let registration =
        repository::registration::update_status(&mut tx, &current.id, target, None, None).await?;

    if current.status.holds_slot() {
        repository::competition::release_slot(&mut tx, &competition.id).await?;
    }

    tx.commit().await?;

    tracing::info!(
        registration_id = %registration.id,
        competition_id = %competition.id,
        cancelled_by = %actor.user_id,
        "Registration cancelled"
    );

    Ok(registration)
}

/// Organizer decision on a registration, optionally updating payment.
///
/// Re-submitting the current status leaves it unchanged so payment-only
/// updates are possible. Moving out of a slot-holding status frees the slot.
pub async fn set_status(
    pool: &PgPool,
    actor: &Actor,
    registration_id: &str,
    req: &UpdateRegistrationStatusRequest,
) -> Result<Registration> {
    let competition_id = RegistrationRepository::new(pool)
        .find_by_id(registration_id)
        .await?
        .competition_id;

    let mut tx = pool.begin().await?;
    let competition = repository::competition::lock(&mut tx, &competition_id).await?;
    let current = repository::registration::lock(&mut tx, registration_id).await?;

    authorize(
        actor,
        Action::ReviewRegistration,
        Resource::Registration {
            owner_id: &current.user_id,
            organizer_id: &competition.organizer_id,
        },
    )?;

    let target = if req.status == current.status {
        current.status
    } else {
        current.status.transition_to(req.status)?
    };

    let registration = repository::registration::update_status(
        &mut tx,
        &current.id,
        target,
        req.payment_status,
        req.payment_id.as_deref(),
    )
    .await?;

    if current.status.slot_delta(target) < 0 {
        repository::competition::release_slot(&mut tx, &competition.id).await?;
    }

    tx.commit().await?;

    tracing::info!(
        registration_id = %registration.id,
        from = %current.status,
        to = %registration.status,
        payment_status = ?registration.payment_status,
        "Registration status updated"
    );

    Ok(registration)
}

/// Administrative hard delete
pub async fn delete_registration(pool: &PgPool, actor: &Actor, registration_id: &str) -> Result<()> {
    let competition_id = RegistrationRepository::new(pool)
        .find_by_id(registration_id)
        .await?
        .competition_id;

    let mut tx = pool.begin().await?;
    let competition = repository::competition::lock(&mut tx, &competition_id).await?;
    let current = repository::registration::lock(&mut tx, registration_id).await?;

    authorize(
        actor,
        Action::DeleteRegistration,
        Resource::Registration {
            owner_id: &current.user_id,
            organizer_id: &competition.organizer_id,
        },
    )?;

    repository::registration::delete(&mut tx, &current.id).await?;
    if current.status.holds_slot() {
        repository::competition::release_slot(&mut tx, &competition.id).await?;
    }

    tx.commit().await?;

    tracing::info!(registration_id = %current.id, "Registration deleted");
    Ok(())
}

/// The user a registration request is for, defaulting to the caller
fn participant_id<'r>(actor: &'r Actor, req: &'r CreateRegistrationRequest) -> &'r str {
    req.user_id.as_deref().unwrap_or(&actor.user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn request(user_id: Option<&str>) -> CreateRegistrationRequest {
        CreateRegistrationRequest {
            competition_id: "comp_1".to_string(),
            user_id: user_id.map(String::from),
            team_id: None,
        }
    }

    #[test]
    fn test_participant_defaults_to_caller() {
        let actor = Actor::new("usr_a", Role::Athlete);
        assert_eq!(participant_id(&actor, &request(None)), "usr_a");
        assert_eq!(participant_id(&actor, &request(Some("usr_b"))), "usr_b");
    }

    #[test]
    fn test_registering_someone_else_needs_admin() {
        let req = request(Some("usr_b"));

        let athlete = Actor::new("usr_a", Role::Athlete);
        let user_id = participant_id(&athlete, &req);
        assert!(authorize(&athlete, Action::RegisterParticipant, Resource::User { user_id }).is_err());

        let admin = Actor::new("usr_admin", Role::Admin);
        let user_id = participant_id(&admin, &req);
        assert!(authorize(&admin, Action::RegisterParticipant, Resource::User { user_id }).is_ok());
    }
}
