//! Team formation: captains, members, invitations and join requests.
//!
//! Mutations lock the competition row and then the team row, the same
//! order admission uses, so team size checks cannot race.

use sqlx::PgPool;

use super::policy::{Action, Resource, authorize};
use crate::dto::team::CreateTeamRequest;
use crate::error::{Result, StorageError};
use crate::models::{
    Actor, Competition, CompetitionStatus, InvitationKind, InvitationStatus, Team,
    TeamInvitation, TeamMember, TeamStatus,
};
use crate::repository::{self, InvitationRepository, TeamRepository, Tx};

/// Size limits applied to every team
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamRules {
    pub max_size: i64,
    pub min_size: i64,
}

impl Default for TeamRules {
    fn default() -> Self {
        Self {
            max_size: 3,
            min_size: 2,
        }
    }
}

impl TeamRules {
    pub fn new(max_size: i64, min_size: i64) -> Result<Self> {
        if max_size < 1 || min_size < 1 || min_size > max_size {
            return Err(StorageError::Validation(format!(
                "invalid team size limits: min {min_size}, max {max_size}"
            )));
        }
        Ok(Self { max_size, min_size })
    }

    fn check_room(&self, member_count: i64) -> Result<()> {
        if member_count >= self.max_size {
            Err(StorageError::TeamFull)
        } else {
            Ok(())
        }
    }
}

/// Result of answering an invitation or request
#[derive(Debug)]
pub struct InvitationOutcome {
    pub invitation: TeamInvitation,
    pub member: Option<TeamMember>,
}

fn ensure_accepting_teams(competition: &Competition) -> Result<()> {
    match competition.status {
        CompetitionStatus::Completed | CompetitionStatus::Cancelled => {
            Err(StorageError::InvalidState(format!(
                "competition is {}",
                competition.status
            )))
        }
        _ => Ok(()),
    }
}

fn team_resource<'a>(team: &'a Team, competition: &'a Competition) -> Resource<'a> {
    Resource::Team {
        captain_id: &team.captain_id,
        organizer_id: &competition.organizer_id,
    }
}

/// Locks the owning competition, then the team
async fn lock_team(pool: &PgPool, tx: &mut Tx<'_>, team_id: &str) -> Result<(Competition, Team)> {
    let competition_id = TeamRepository::new(pool)
        .find_by_id(team_id)
        .await?
        .competition_id;

    let competition = repository::competition::lock(tx, &competition_id).await?;
    let team = repository::team::lock(tx, team_id).await?;
    Ok((competition, team))
}

/// Re-evaluates the team status after its membership changed
async fn settle_status(tx: &mut Tx<'_>, rules: TeamRules, team: &Team) -> Result<TeamStatus> {
    let count = repository::team::member_count(tx, &team.id).await?;
    let next = team.status.after_membership_change(count, rules.min_size);

    if next != team.status {
        repository::team::set_status(tx, &team.id, next).await?;
        tracing::info!(team_id = %team.id, from = %team.status, to = %next, "Team status changed");
    }

    Ok(next)
}

/// Membership checks shared by direct adds and accepted invitations
async fn add_member_locked(
    tx: &mut Tx<'_>,
    rules: TeamRules,
    competition: &Competition,
    team: &Team,
    user_id: &str,
) -> Result<TeamMember> {
    ensure_accepting_teams(competition)?;

    if team.status == TeamStatus::Rejected {
        return Err(StorageError::InvalidState("team was rejected".to_string()));
    }

    repository::user::ensure_exists(tx, user_id).await?;

    if let Some(existing) = repository::team::find_membership(tx, &competition.id, user_id).await? {
        let reason = if existing.team_id == team.id {
            "user is already a member of this team"
        } else {
            "user already belongs to another team in this competition"
        };
        return Err(StorageError::Conflict(reason.to_string()));
    }

    let count = repository::team::member_count(tx, &team.id).await?;
    rules.check_room(count)?;

    let member = repository::team::insert_member(tx, team, user_id, false).await?;
    settle_status(tx, rules, team).await?;

    Ok(member)
}

/// Creates a team with its captain as the first member
pub async fn create_team(
    pool: &PgPool,
    actor: &Actor,
    rules: TeamRules,
    req: &CreateTeamRequest,
) -> Result<Team> {
    let captain_id = req.captain_id.as_deref().unwrap_or(&actor.user_id);

    let mut tx = pool.begin().await?;
    let competition = repository::competition::lock(&mut tx, &req.competition_id).await?;

    if !actor.is(captain_id) {
        authorize(
            actor,
            Action::ManageCompetition,
            Resource::Competition {
                organizer_id: &competition.organizer_id,
            },
        )?;
    }

    ensure_accepting_teams(&competition)?;
    repository::user::ensure_exists(&mut tx, captain_id).await?;

    if repository::team::find_membership(&mut tx, &competition.id, captain_id)
        .await?
        .is_some()
    {
        return Err(StorageError::Conflict(
            "captain already belongs to a team in this competition".to_string(),
        ));
    }

    let status = TeamStatus::NeedsMembers.after_membership_change(1, rules.min_size);
    let team =
        repository::team::insert(&mut tx, &competition.id, req.name.trim(), captain_id, status)
            .await?;
    repository::team::insert_member(&mut tx, &team, captain_id, true).await?;

    tx.commit().await?;

    tracing::info!(
        team_id = %team.id,
        competition_id = %team.competition_id,
        captain_id = %team.captain_id,
        "Team created"
    );

    Ok(team)
}

pub async fn add_member(
    pool: &PgPool,
    actor: &Actor,
    rules: TeamRules,
    team_id: &str,
    user_id: &str,
) -> Result<TeamMember> {
    let mut tx = pool.begin().await?;
    let (competition, team) = lock_team(pool, &mut tx, team_id).await?;

    authorize(actor, Action::ManageTeam, team_resource(&team, &competition))?;

    let member = add_member_locked(&mut tx, rules, &competition, &team, user_id).await?;
    tx.commit().await?;

    tracing::info!(team_id, user_id, added_by = %actor.user_id, "Team member added");
    Ok(member)
}

/// Removes a non-captain member; members may remove themselves
pub async fn remove_member(
    pool: &PgPool,
    actor: &Actor,
    rules: TeamRules,
    team_id: &str,
    user_id: &str,
) -> Result<()> {
    let mut tx = pool.begin().await?;
    let (competition, team) = lock_team(pool, &mut tx, team_id).await?;

    authorize(
        actor,
        Action::LeaveTeam,
        Resource::TeamMember {
            member_id: user_id,
            captain_id: &team.captain_id,
            organizer_id: &competition.organizer_id,
        },
    )?;

    let member = repository::team::find_membership(&mut tx, &competition.id, user_id)
        .await?
        .filter(|m| m.team_id == team.id)
        .ok_or(StorageError::NotFound("Team member"))?;

    if member.is_captain {
        return Err(StorageError::InvalidState(
            "the captain cannot leave; disband the team instead".to_string(),
        ));
    }

    repository::team::delete_member(&mut tx, &team.id, user_id).await?;
    repository::registration::detach_team(&mut tx, &team.id, user_id).await?;
    settle_status(&mut tx, rules, &team).await?;

    tx.commit().await?;

    tracing::info!(team_id, user_id, removed_by = %actor.user_id, "Team member removed");
    Ok(())
}

/// Deletes the team with its memberships and invitations
pub async fn disband(pool: &PgPool, actor: &Actor, team_id: &str) -> Result<()> {
    let mut tx = pool.begin().await?;
    let (competition, team) = lock_team(pool, &mut tx, team_id).await?;

    authorize(actor, Action::ManageTeam, team_resource(&team, &competition))?;

    repository::team::delete(&mut tx, &team.id).await?;
    tx.commit().await?;

    tracing::info!(team_id, disbanded_by = %actor.user_id, "Team disbanded");
    Ok(())
}

/// Organizer review of a team
pub async fn set_team_status(
    pool: &PgPool,
    actor: &Actor,
    team_id: &str,
    target: TeamStatus,
) -> Result<Team> {
    let mut tx = pool.begin().await?;
    let (competition, team) = lock_team(pool, &mut tx, team_id).await?;

    authorize(actor, Action::ReviewTeam, team_resource(&team, &competition))?;

    let target = team.status.review_to(target)?;
    let updated = repository::team::set_status(&mut tx, &team.id, target).await?;
    tx.commit().await?;

    tracing::info!(team_id, from = %team.status, to = %updated.status, "Team reviewed");
    Ok(updated)
}

/// Captain invites a user into the team
pub async fn invite(
    pool: &PgPool,
    actor: &Actor,
    rules: TeamRules,
    team_id: &str,
    user_id: &str,
) -> Result<TeamInvitation> {
    let mut tx = pool.begin().await?;
    let (competition, team) = lock_team(pool, &mut tx, team_id).await?;

    authorize(actor, Action::ManageTeam, team_resource(&team, &competition))?;

    let invitation =
        propose(&mut tx, rules, &competition, &team, user_id, InvitationKind::Invite).await?;
    tx.commit().await?;

    tracing::info!(invitation_id = %invitation.id, team_id, user_id, "Invitation sent");
    Ok(invitation)
}

/// Caller asks the captain to join the team
pub async fn request_to_join(
    pool: &PgPool,
    actor: &Actor,
    rules: TeamRules,
    team_id: &str,
) -> Result<TeamInvitation> {
    let mut tx = pool.begin().await?;
    let (competition, team) = lock_team(pool, &mut tx, team_id).await?;

    let invitation = propose(
        &mut tx,
        rules,
        &competition,
        &team,
        &actor.user_id,
        InvitationKind::Request,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(invitation_id = %invitation.id, team_id, user_id = %actor.user_id, "Join request sent");
    Ok(invitation)
}

async fn propose(
    tx: &mut Tx<'_>,
    rules: TeamRules,
    competition: &Competition,
    team: &Team,
    user_id: &str,
    kind: InvitationKind,
) -> Result<TeamInvitation> {
    ensure_accepting_teams(competition)?;
    repository::user::ensure_exists(tx, user_id).await?;

    if repository::team::find_membership(tx, &competition.id, user_id)
        .await?
        .is_some()
    {
        return Err(StorageError::Conflict(
            "user already belongs to a team in this competition".to_string(),
        ));
    }

    let count = repository::team::member_count(tx, &team.id).await?;
    rules.check_room(count)?;

    repository::team::insert_invitation(tx, &team.id, user_id, kind).await
}

/// Answers an invitation (by the invited user) or a request (by the captain).
///
/// Acceptance adds the member in the same transaction; if that fails the
/// invitation stays pending.
pub async fn respond(
    pool: &PgPool,
    actor: &Actor,
    rules: TeamRules,
    invitation_id: &str,
    accept: bool,
) -> Result<InvitationOutcome> {
    let team_id = InvitationRepository::new(pool)
        .find_by_id(invitation_id)
        .await?
        .team_id;

    let mut tx = pool.begin().await?;
    let (competition, team) = lock_team(pool, &mut tx, &team_id).await?;
    let current = repository::team::lock_invitation(&mut tx, invitation_id).await?;

    match current.kind {
        InvitationKind::Invite => authorize(
            actor,
            Action::RespondInvitation,
            Resource::Invitation {
                recipient_id: &current.user_id,
            },
        )?,
        InvitationKind::Request => {
            authorize(actor, Action::ManageTeam, team_resource(&team, &competition))?
        }
    }

    if current.status != InvitationStatus::Pending {
        return Err(StorageError::InvalidState(
            "invitation was already answered".to_string(),
        ));
    }

    let member = if accept {
        Some(add_member_locked(&mut tx, rules, &competition, &team, &current.user_id).await?)
    } else {
        None
    };

    let status = if accept {
        InvitationStatus::Accepted
    } else {
        InvitationStatus::Rejected
    };
    let invitation = repository::team::set_invitation_status(&mut tx, &current.id, status).await?;

    tx.commit().await?;

    tracing::info!(
        invitation_id,
        team_id = %team.id,
        user_id = %invitation.user_id,
        accepted = accept,
        "Invitation answered"
    );

    Ok(InvitationOutcome { invitation, member })
}
