use sqlx::PgPool;
use storage::{
    error::Result,
    models::{Actor, InvitationKind, InvitationStatus, TeamInvitation},
    repository::{InvitationRepository, TeamRepository, UserRepository},
    services::{InvitationOutcome, team_formation},
};

use crate::notifications::notify_best_effort;
use crate::state::AppState;

pub async fn list_incoming(pool: &PgPool, actor: &Actor) -> Result<Vec<TeamInvitation>> {
    InvitationRepository::new(pool).list_incoming(&actor.user_id).await
}

/// Answers an invitation or join request; the requester hears back
/// when the captain decides on their request
pub async fn respond(
    state: &AppState,
    actor: &Actor,
    invitation_id: &str,
    accept: bool,
) -> Result<InvitationOutcome> {
    let pool = state.db.pool();
    let outcome =
        team_formation::respond(pool, actor, state.team_rules, invitation_id, accept).await?;

    if outcome.invitation.kind == InvitationKind::Request {
        let team = TeamRepository::new(pool)
            .find_by_id(&outcome.invitation.team_id)
            .await?;
        let requester = UserRepository::new(pool)
            .find_by_id(&outcome.invitation.user_id)
            .await?;
        let verdict = match outcome.invitation.status {
            InvitationStatus::Accepted => "accepted",
            _ => "declined",
        };
        notify_best_effort(
            state.notifier.as_ref(),
            &requester.email,
            "Team request answered",
            &format!(
                "Hello {}, your request to join \"{}\" was {verdict}.",
                requester.name, team.name
            ),
        )
        .await;
    }

    Ok(outcome)
}
