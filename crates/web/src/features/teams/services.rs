use sqlx::PgPool;
use storage::{
    dto::team::{CreateTeamRequest, TeamDetailResponse, TeamFilter, TeamListItem},
    error::Result,
    models::{Actor, Team, TeamInvitation, TeamMember, TeamStatus},
    repository::{CompetitionRepository, InvitationRepository, TeamRepository, UserRepository},
    services::policy::{Action, Resource, authorize},
    services::team_formation,
};

use crate::notifications::notify_best_effort;
use crate::state::AppState;

pub async fn list_teams(pool: &PgPool, filter: &TeamFilter) -> Result<Vec<TeamListItem>> {
    TeamRepository::new(pool).list(filter).await
}

pub async fn get_team(pool: &PgPool, id: &str) -> Result<TeamDetailResponse> {
    TeamRepository::new(pool).find_detail(id).await
}

pub async fn create_team(state: &AppState, actor: &Actor, request: &CreateTeamRequest) -> Result<Team> {
    team_formation::create_team(state.db.pool(), actor, state.team_rules, request).await
}

pub async fn add_member(state: &AppState, actor: &Actor, team_id: &str, user_id: &str) -> Result<TeamMember> {
    team_formation::add_member(state.db.pool(), actor, state.team_rules, team_id, user_id).await
}

pub async fn remove_member(state: &AppState, actor: &Actor, team_id: &str, user_id: &str) -> Result<()> {
    team_formation::remove_member(state.db.pool(), actor, state.team_rules, team_id, user_id).await
}

pub async fn disband(pool: &PgPool, actor: &Actor, team_id: &str) -> Result<()> {
    team_formation::disband(pool, actor, team_id).await
}

pub async fn set_status(pool: &PgPool, actor: &Actor, team_id: &str, status: TeamStatus) -> Result<Team> {
    team_formation::set_team_status(pool, actor, team_id, status).await
}

/// Invites a user and lets them know
pub async fn invite(state: &AppState, actor: &Actor, team_id: &str, user_id: &str) -> Result<TeamInvitation> {
    let pool = state.db.pool();
    let invitation = team_formation::invite(pool, actor, state.team_rules, team_id, user_id).await?;

    let team = TeamRepository::new(pool).find_by_id(team_id).await?;
    let invitee = UserRepository::new(pool).find_by_id(user_id).await?;
    notify_best_effort(
        state.notifier.as_ref(),
        &invitee.email,
        "Team invitation",
        &format!(
            "Hello {}, you were invited to join the team \"{}\". Invitation id: {}",
            invitee.name, team.name, invitation.id
        ),
    )
    .await;

    Ok(invitation)
}

/// Asks to join a team and tells the captain
pub async fn request_to_join(state: &AppState, actor: &Actor, team_id: &str) -> Result<TeamInvitation> {
    let pool = state.db.pool();
    let request = team_formation::request_to_join(pool, actor, state.team_rules, team_id).await?;

    let team = TeamRepository::new(pool).find_by_id(team_id).await?;
    let users = UserRepository::new(pool);
    let captain = users.find_by_id(&team.captain_id).await?;
    let requester = users.find_by_id(&actor.user_id).await?;
    notify_best_effort(
        state.notifier.as_ref(),
        &captain.email,
        "Request to join your team",
        &format!(
            "{} asked to join the team \"{}\". Request id: {}",
            requester.name, team.name, request.id
        ),
    )
    .await;

    Ok(request)
}

/// Pending and answered proposals of a team, for its captain or organizer
pub async fn list_invitations(pool: &PgPool, actor: &Actor, team_id: &str) -> Result<Vec<TeamInvitation>> {
    let team = TeamRepository::new(pool).find_by_id(team_id).await?;
    let competition = CompetitionRepository::new(pool)
        .find_by_id(&team.competition_id)
        .await?;

    authorize(
        actor,
        Action::ManageTeam,
        Resource::Team {
            captain_id: &team.captain_id,
            organizer_id: &competition.organizer_id,
        },
    )?;

    InvitationRepository::new(pool).list_for_team(team_id).await
}
