use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{
    InvitationKind, InvitationStatus, Team, TeamInvitation, TeamStatus,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, message = "competition_id is required"))]
    pub competition_id: String,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Team name must be between 1 and 100 characters"
    ))]
    pub name: String,

    /// Defaults to the caller
    pub captain_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddMemberRequest {
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateTeamStatusRequest {
    pub status: TeamStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RespondInvitationRequest {
    pub accept: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct TeamFilter {
    pub competition_id: Option<String>,
    /// Teams the user is a member of
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamResponse {
    pub id: String,
    pub name: String,
    pub competition_id: String,
    pub captain_id: String,
    pub status: TeamStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Team> for TeamResponse {
    fn from(team: Team) -> Self {
        Self {
            id: team.id,
            name: team.name,
            competition_id: team.competition_id,
            captain_id: team.captain_id,
            status: team.status,
            created_at: team.created_at,
            updated_at: team.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct TeamListItem {
    pub id: String,
    pub name: String,
    pub competition_id: String,
    pub competition_title: String,
    pub captain_id: String,
    pub captain_name: String,
    pub status: TeamStatus,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct MemberInfo {
    pub user_id: String,
    pub name: String,
    pub is_captain: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamDetailResponse {
    #[serde(flatten)]
    pub team: TeamResponse,
    pub members: Vec<MemberInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvitationResponse {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub kind: InvitationKind,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TeamInvitation> for InvitationResponse {
    fn from(inv: TeamInvitation) -> Self {
        Self {
            id: inv.id,
            team_id: inv.team_id,
            user_id: inv.user_id,
            kind: inv.kind,
            status: inv.status,
            created_at: inv.created_at,
            updated_at: inv.updated_at,
        }
    }
}
