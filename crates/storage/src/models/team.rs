use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::{Result, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "team_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamStatus {
    Pending,
    Confirmed,
    NeedsMembers,
    Rejected,
}

impl TeamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::NeedsMembers => "NEEDS_MEMBERS",
            Self::Rejected => "REJECTED",
        }
    }

    /// Review decisions an organizer may take
    pub fn review_to(&self, target: TeamStatus) -> Result<TeamStatus> {
        use TeamStatus::*;
        match (self, target) {
            (Pending, Confirmed) | (Pending, Rejected) | (Confirmed, Rejected) => Ok(target),
            _ => Err(StorageError::InvalidTeamTransition {
                from: *self,
                to: target,
            }),
        }
    }

    /// Status a team settles in once its membership becomes `member_count`.
    ///
    /// Teams below the minimum size need members; a team reaching it waits
    /// for review. Rejected teams are never changed here.
    pub fn after_membership_change(&self, member_count: i64, min_size: i64) -> TeamStatus {
        use TeamStatus::*;
        match self {
            Rejected => Rejected,
            NeedsMembers if member_count >= min_size => Pending,
            Pending | Confirmed if member_count < min_size => NeedsMembers,
            other => *other,
        }
    }
}

impl std::fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub competition_id: String,
    pub captain_id: String,
    pub status: TeamStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TeamMember {
    pub id: String,
    pub team_id: String,
    pub competition_id: String,
    pub user_id: String,
    pub is_captain: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "invitation_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationKind {
    /// Captain asks a user to join
    Invite,
    /// User asks the captain to be let in
    Request,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "invitation_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TeamInvitation {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub kind: InvitationKind,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
