use sqlx::{PgPool, Postgres, QueryBuilder};

use super::Tx;
use crate::dto::registration::{RegistrationDetail, RegistrationFilter};
use crate::error::{Result, StorageError};
use crate::models::{IdKind, PaymentStatus, Registration, RegistrationStatus, new_id};

const DETAIL_SELECT: &str = r#"
    SELECT r.id, r.competition_id, c.title AS competition_title,
           c.event_start AS competition_event_start,
           r.user_id, u.name AS user_name, u.email AS user_email,
           r.team_id, t.name AS team_name,
           r.status, r.payment_status, r.created_at, r.updated_at
    FROM registrations r
    JOIN competitions c ON c.id = r.competition_id
    JOIN users u ON u.id = r.user_id
    LEFT JOIN teams t ON t.id = r.team_id
    WHERE TRUE
"#;

/// Which registrations a listing may reveal
#[derive(Debug, Clone, Copy)]
pub enum RegistrationScope<'s> {
    Everything,
    /// Only the user's own registrations
    Participant(&'s str),
    /// The user's own plus those in competitions they organize
    ParticipantOrOrganizer(&'s str),
    /// Registrations in competitions organized by this user
    OrganizedBy(&'s str),
}

/// Who to tell when a registration is cancelled on their behalf
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParticipantContact {
    pub registration_id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
}

pub struct RegistrationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RegistrationRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Registration> {
        sqlx::query_as::<_, Registration>("SELECT * FROM registrations WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound("Registration"))
    }

    pub async fn find_detail(&self, id: &str) -> Result<RegistrationDetail> {
        let mut query = QueryBuilder::<Postgres>::new(DETAIL_SELECT);
        query.push(" AND r.id = ").push_bind(id.to_string());

        query
            .build_query_as::<RegistrationDetail>()
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound("Registration"))
    }

    pub async fn list(
        &self,
        filter: &RegistrationFilter,
        scope: RegistrationScope<'_>,
    ) -> Result<Vec<RegistrationDetail>> {
        let mut query = QueryBuilder::<Postgres>::new(DETAIL_SELECT);

        match scope {
            RegistrationScope::Everything => {}
            RegistrationScope::Participant(user_id) => {
                query.push(" AND r.user_id = ").push_bind(user_id.to_string());
            }
            RegistrationScope::ParticipantOrOrganizer(user_id) => {
                query
                    .push(" AND (r.user_id = ")
                    .push_bind(user_id.to_string())
                    .push(" OR c.organizer_id = ")
                    .push_bind(user_id.to_string())
                    .push(")");
            }
            RegistrationScope::OrganizedBy(organizer_id) => {
                query
                    .push(" AND c.organizer_id = ")
                    .push_bind(organizer_id.to_string());
            }
        }

        if let Some(user_id) = filter.user_id.as_deref() {
            query.push(" AND r.user_id = ").push_bind(user_id.to_string());
        }
        if let Some(competition_id) = filter.competition_id.as_deref() {
            query
                .push(" AND r.competition_id = ")
                .push_bind(competition_id.to_string());
        }
        if let Some(status) = filter.status {
            query.push(" AND r.status = ").push_bind(status);
        }

        query.push(" ORDER BY r.created_at DESC");

        let rows = query
            .build_query_as::<RegistrationDetail>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows)
    }

    /// Whether the user holds a non-cancelled registration
    pub async fn is_registered(&self, user_id: &str, competition_id: &str) -> Result<bool> {
        let registered: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM registrations
                WHERE user_id = $1 AND competition_id = $2 AND status <> 'CANCELLED'
            )
            "#,
        )
        .bind(user_id)
        .bind(competition_id)
        .fetch_one(self.pool)
        .await?;

        Ok(registered)
    }

    /// Registrations currently holding a slot
    pub async fn count_holding_slot(&self, competition_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM registrations
            WHERE competition_id = $1 AND status IN ('PENDING', 'CONFIRMED')
            "#,
        )
        .bind(competition_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }
}

pub async fn lock(tx: &mut Tx<'_>, id: &str) -> Result<Registration> {
    sqlx::query_as::<_, Registration>("SELECT * FROM registrations WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StorageError::NotFound("Registration"))
}

pub async fn find_active(
    tx: &mut Tx<'_>,
    user_id: &str,
    competition_id: &str,
) -> Result<Option<Registration>> {
    let registration = sqlx::query_as::<_, Registration>(
        r#"
        SELECT * FROM registrations
        WHERE user_id = $1 AND competition_id = $2 AND status <> 'CANCELLED'
        "#,
    )
    .bind(user_id)
    .bind(competition_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(registration)
}

/// Inserts a PENDING registration; a concurrent duplicate surfaces as `AlreadyRegistered`
pub async fn insert(
    tx: &mut Tx<'_>,
    competition_id: &str,
    user_id: &str,
    team_id: Option<&str>,
) -> Result<Registration> {
    sqlx::query_as::<_, Registration>(
        r#"
        INSERT INTO registrations (id, competition_id, user_id, team_id, status, payment_status)
        VALUES ($1, $2, $3, $4, 'PENDING', 'PENDING')
        RETURNING *
        "#,
    )
    .bind(new_id(IdKind::Registration))
    .bind(competition_id)
    .bind(user_id)
    .bind(team_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| {
        let err = StorageError::from(e);
        if err.is_unique_violation() {
            StorageError::AlreadyRegistered
        } else {
            err
        }
    })
}

pub async fn update_status(
    tx: &mut Tx<'_>,
    id: &str,
    status: RegistrationStatus,
    payment_status: Option<PaymentStatus>,
    payment_id: Option<&str>,
) -> Result<Registration> {
    let registration = sqlx::query_as::<_, Registration>(
        r#"
        UPDATE registrations
        SET status = $2,
            payment_status = COALESCE($3, payment_status),
            payment_id = COALESCE($4, payment_id),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(payment_status)
    .bind(payment_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(registration)
}

pub async fn delete(tx: &mut Tx<'_>, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM registrations WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

/// Cancels every slot-holding registration of a competition
pub async fn cancel_all_active(
    tx: &mut Tx<'_>,
    competition_id: &str,
) -> Result<Vec<ParticipantContact>> {
    let contacts = sqlx::query_as::<_, ParticipantContact>(
        r#"
        UPDATE registrations r
        SET status = 'CANCELLED', updated_at = NOW()
        FROM users u
        WHERE u.id = r.user_id
          AND r.competition_id = $1
          AND r.status IN ('PENDING', 'CONFIRMED')
        RETURNING r.id AS registration_id, r.user_id, u.name, u.email
        "#,
    )
    .bind(competition_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(contacts)
}

/// Detaches a departing member's registration from the team
pub async fn detach_team(tx: &mut Tx<'_>, team_id: &str, user_id: &str) -> Result<()> {
    sqlx::query(
        "UPDATE registrations SET team_id = NULL, updated_at = NOW() WHERE team_id = $1 AND user_id = $2",
    )
    .bind(team_id)
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
