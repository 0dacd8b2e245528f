use sqlx::PgPool;
use storage::{
    dto::common::PageParams,
    dto::competition::{CompetitionFilter, CompetitionListItem},
    dto::organizer::{OrganizerScope, OrganizerStats},
    dto::registration::{RegistrationDetail, RegistrationFilter},
    error::{Result, StorageError},
    models::Actor,
    repository::{CompetitionRepository, OrganizerRepository, RegistrationRepository, RegistrationScope},
};

/// Whose dashboard the caller is reading. Administrators may look at
/// any organizer; organizers only at themselves.
fn resolve_organizer<'a>(actor: &'a Actor, requested: Option<&'a str>) -> Result<&'a str> {
    if !actor.role.can_organize() {
        return Err(StorageError::Forbidden(
            "the organizer dashboard requires the ORGANIZER role".to_string(),
        ));
    }

    match requested {
        Some(id) if actor.is_admin() || actor.is(id) => Ok(id),
        Some(_) => Err(StorageError::Forbidden(
            "organizers can only read their own dashboard".to_string(),
        )),
        None => Ok(&actor.user_id),
    }
}

pub async fn stats(pool: &PgPool, actor: &Actor, scope: &OrganizerScope) -> Result<OrganizerStats> {
    let organizer_id = resolve_organizer(actor, scope.organizer_id.as_deref())?;
    OrganizerRepository::new(pool).stats(organizer_id).await
}

pub async fn competitions(
    pool: &PgPool,
    actor: &Actor,
    scope: &OrganizerScope,
    page: PageParams,
) -> Result<(Vec<CompetitionListItem>, i64)> {
    page.validate()?;
    let organizer_id = resolve_organizer(actor, scope.organizer_id.as_deref())?;

    let filter = CompetitionFilter {
        organizer_id: Some(organizer_id.to_string()),
        ..CompetitionFilter::default()
    };
    CompetitionRepository::new(pool).list(&filter, page).await
}

pub async fn registrations(
    pool: &PgPool,
    actor: &Actor,
    scope: &OrganizerScope,
) -> Result<Vec<RegistrationDetail>> {
    let organizer_id = resolve_organizer(actor, scope.organizer_id.as_deref())?;

    let filter = RegistrationFilter {
        user_id: None,
        competition_id: scope.competition_id.clone(),
        status: scope.status,
    };
    RegistrationRepository::new(pool)
        .list(&filter, RegistrationScope::OrganizedBy(organizer_id))
        .await
}
