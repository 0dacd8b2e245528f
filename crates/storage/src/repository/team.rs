use sqlx::{PgPool, Postgres, QueryBuilder};

use super::Tx;
use crate::dto::team::{MemberInfo, TeamDetailResponse, TeamFilter, TeamListItem};
use crate::error::{Result, StorageError};
use crate::models::{
    IdKind, InvitationKind, InvitationStatus, Team, TeamInvitation, TeamMember, TeamStatus, new_id,
};

pub struct TeamRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TeamRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Team> {
        sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound("Team"))
    }

    pub async fn find_detail(&self, id: &str) -> Result<TeamDetailResponse> {
        let team = self.find_by_id(id).await?;
        let members = self.members(id).await?;

        Ok(TeamDetailResponse {
            team: team.into(),
            members,
        })
    }

    /// Members with the captain listed first
    pub async fn members(&self, team_id: &str) -> Result<Vec<MemberInfo>> {
        let members = sqlx::query_as::<_, MemberInfo>(
            r#"
            SELECT m.user_id, u.name, m.is_captain, m.joined_at
            FROM team_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.team_id = $1
            ORDER BY m.is_captain DESC, m.joined_at
            "#,
        )
        .bind(team_id)
        .fetch_all(self.pool)
        .await?;

        Ok(members)
    }

    pub async fn list(&self, filter: &TeamFilter) -> Result<Vec<TeamListItem>> {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT t.id, t.name, t.competition_id, c.title AS competition_title,
                   t.captain_id, u.name AS captain_name, t.status,
                   (SELECT COUNT(*) FROM team_members m WHERE m.team_id = t.id) AS member_count,
                   t.created_at
            FROM teams t
            JOIN competitions c ON c.id = t.competition_id
            JOIN users u ON u.id = t.captain_id
            WHERE TRUE
            "#,
        );

        if let Some(competition_id) = filter.competition_id.as_deref() {
            query
                .push(" AND t.competition_id = ")
                .push_bind(competition_id.to_string());
        }
        if let Some(user_id) = filter.user_id.as_deref() {
            query
                .push(" AND EXISTS (SELECT 1 FROM team_members m WHERE m.team_id = t.id AND m.user_id = ")
                .push_bind(user_id.to_string())
                .push(")");
        }
        query.push(" ORDER BY t.created_at DESC");

        let teams = query.build_query_as::<TeamListItem>().fetch_all(self.pool).await?;
        Ok(teams)
    }
}

pub async fn lock(tx: &mut Tx<'_>, id: &str) -> Result<Team> {
    sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = $1 FOR NO KEY UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StorageError::NotFound("Team"))
}

pub async fn insert(
    tx: &mut Tx<'_>,
    competition_id: &str,
    name: &str,
    captain_id: &str,
    status: TeamStatus,
) -> Result<Team> {
    let team = sqlx::query_as::<_, Team>(
        r#"
        INSERT INTO teams (id, name, competition_id, captain_id, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(new_id(IdKind::Team))
    .bind(name)
    .bind(competition_id)
    .bind(captain_id)
    .bind(status)
    .fetch_one(&mut **tx)
    .await?;

    Ok(team)
}

pub async fn set_status(tx: &mut Tx<'_>, id: &str, status: TeamStatus) -> Result<Team> {
    let team = sqlx::query_as::<_, Team>(
        "UPDATE teams SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_one(&mut **tx)
    .await?;

    Ok(team)
}

pub async fn delete(tx: &mut Tx<'_>, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM teams WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

pub async fn member_count(tx: &mut Tx<'_>, team_id: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM team_members WHERE team_id = $1")
        .bind(team_id)
        .fetch_one(&mut **tx)
        .await?;

    Ok(count)
}

/// The membership a user holds in any team of the competition
pub async fn find_membership(
    tx: &mut Tx<'_>,
    competition_id: &str,
    user_id: &str,
) -> Result<Option<TeamMember>> {
    let member = sqlx::query_as::<_, TeamMember>(
        "SELECT * FROM team_members WHERE competition_id = $1 AND user_id = $2",
    )
    .bind(competition_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(member)
}

pub async fn insert_member(
    tx: &mut Tx<'_>,
    team: &Team,
    user_id: &str,
    is_captain: bool,
) -> Result<TeamMember> {
    sqlx::query_as::<_, TeamMember>(
        r#"
        INSERT INTO team_members (id, team_id, competition_id, user_id, is_captain)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(new_id(IdKind::TeamMember))
    .bind(&team.id)
    .bind(&team.competition_id)
    .bind(user_id)
    .bind(is_captain)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| {
        let err = StorageError::from(e);
        if err.is_unique_violation() {
            StorageError::Conflict(
                "user already belongs to a team in this competition".to_string(),
            )
        } else {
            err
        }
    })
}

pub async fn delete_member(tx: &mut Tx<'_>, team_id: &str, user_id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND user_id = $2")
        .bind(team_id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::NotFound("Team member"));
    }

    Ok(())
}

pub struct InvitationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InvitationRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<TeamInvitation> {
        sqlx::query_as::<_, TeamInvitation>("SELECT * FROM team_invitations WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound("Invitation"))
    }

    pub async fn list_for_team(&self, team_id: &str) -> Result<Vec<TeamInvitation>> {
        let invitations = sqlx::query_as::<_, TeamInvitation>(
            "SELECT * FROM team_invitations WHERE team_id = $1 ORDER BY created_at DESC",
        )
        .bind(team_id)
        .fetch_all(self.pool)
        .await?;

        Ok(invitations)
    }

    /// Pending invitations addressed to the user
    pub async fn list_incoming(&self, user_id: &str) -> Result<Vec<TeamInvitation>> {
        let invitations = sqlx::query_as::<_, TeamInvitation>(
            r#"
            SELECT * FROM team_invitations
            WHERE user_id = $1 AND kind = 'INVITE' AND status = 'PENDING'
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(invitations)
    }
}

pub async fn lock_invitation(tx: &mut Tx<'_>, id: &str) -> Result<TeamInvitation> {
    sqlx::query_as::<_, TeamInvitation>("SELECT * FROM team_invitations WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StorageError::NotFound("Invitation"))
}

pub async fn insert_invitation(
    tx: &mut Tx<'_>,
    team_id: &str,
    user_id: &str,
    kind: InvitationKind,
) -> Result<TeamInvitation> {
    sqlx::query_as::<_, TeamInvitation>(
        r#"
        INSERT INTO team_invitations (id, team_id, user_id, kind, status)
        VALUES ($1, $2, $3, $4, 'PENDING')
        RETURNING *
        "#,
    )
    .bind(new_id(IdKind::Invitation))
    .bind(team_id)
    .bind(user_id)
    .bind(kind)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| {
        let err = StorageError::from(e);
        if err.is_unique_violation() {
            StorageError::Conflict("a pending invitation already exists".to_string())
        } else {
            err
        }
    })
}

pub async fn set_invitation_status(
    tx: &mut Tx<'_>,
    id: &str,
    status: InvitationStatus,
) -> Result<TeamInvitation> {
    let invitation = sqlx::query_as::<_, TeamInvitation>(
        "UPDATE team_invitations SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_one(&mut **tx)
    .await?;

    Ok(invitation)
}
