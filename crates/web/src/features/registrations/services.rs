use chrono::Utc;
use sqlx::PgPool;
use storage::{
    dto::registration::{
        CreateRegistrationRequest, RegistrationDetail, RegistrationFilter,
        UpdateRegistrationStatusRequest,
    },
    error::Result,
    models::{Actor, Registration, Role},
    repository::{CompetitionRepository, RegistrationRepository, RegistrationScope},
    services::admission,
    services::policy::{Action, Resource, authorize},
};

/// What a caller may see in a registration listing
fn scope_for(actor: &Actor) -> RegistrationScope<'_> {
    match actor.role {
        Role::Admin => RegistrationScope::Everything,
        Role::Organizer => RegistrationScope::ParticipantOrOrganizer(&actor.user_id),
        Role::Athlete => RegistrationScope::Participant(&actor.user_id),
    }
}

pub async fn register(
    pool: &PgPool,
    actor: &Actor,
    request: &CreateRegistrationRequest,
) -> Result<Registration> {
    admission::register(pool, actor, request, Utc::now()).await
}

pub async fn list_registrations(
    pool: &PgPool,
    actor: &Actor,
    filter: &RegistrationFilter,
) -> Result<Vec<RegistrationDetail>> {
    RegistrationRepository::new(pool)
        .list(filter, scope_for(actor))
        .await
}

pub async fn is_registered(pool: &PgPool, actor: &Actor, competition_id: &str) -> Result<bool> {
    RegistrationRepository::new(pool)
        .is_registered(&actor.user_id, competition_id)
        .await
}

pub async fn get_registration(pool: &PgPool, actor: &Actor, id: &str) -> Result<RegistrationDetail> {
    let repo = RegistrationRepository::new(pool);
    let registration = repo.find_by_id(id).await?;
    let competition = CompetitionRepository::new(pool)
        .find_by_id(&registration.competition_id)
        .await?;

    authorize(
        actor,
        Action::ViewRegistration,
        Resource::Registration {
            owner_id: &registration.user_id,
            organizer_id: &competition.organizer_id,
        },
    )?;

    repo.find_detail(id).await
}

pub async fn set_status(
    pool: &PgPool,
    actor: &Actor,
    id: &str,
    request: &UpdateRegistrationStatusRequest,
) -> Result<Registration> {
    admission::set_status(pool, actor, id, request).await
}

pub async fn cancel(pool: &PgPool, actor: &Actor, id: &str) -> Result<Registration> {
    admission::cancel(pool, actor, id).await
}

pub async fn delete_registration(pool: &PgPool, actor: &Actor, id: &str) -> Result<()> {
    admission::delete_registration(pool, actor, id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn athletes_only_see_their_own_registrations() {
        let actor = Actor::new("usr_a", Role::Athlete);
        assert!(matches!(scope_for(&actor), RegistrationScope::Participant("usr_a")));
    }

    #[test]
    fn organizers_also_see_their_competitions() {
        let actor = Actor::new("usr_o", Role::Organizer);
        assert!(matches!(
            scope_for(&actor),
            RegistrationScope::ParticipantOrOrganizer("usr_o")
        ));
    }

    #[test]
    fn admins_see_everything() {
        let actor = Actor::new("usr_x", Role::Admin);
        assert!(matches!(scope_for(&actor), RegistrationScope::Everything));
    }
}
