use sqlx::PgPool;

use crate::dto::organizer::{OrganizerStats, RecentRegistration};
use crate::error::Result;

#[derive(sqlx::FromRow)]
struct Totals {
    total_competitions: i64,
    active_competitions: i64,
    total_registrations: i64,
    pending_registrations: i64,
}

pub struct OrganizerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrganizerRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn stats(&self, organizer_id: &str) -> Result<OrganizerStats> {
        let totals = sqlx::query_as::<_, Totals>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM competitions WHERE organizer_id = $1) AS total_competitions,
                (SELECT COUNT(*) FROM competitions
                  WHERE organizer_id = $1
                    AND status IN ('REGISTRATION_OPEN', 'IN_PROGRESS')) AS active_competitions,
                (SELECT COUNT(*) FROM registrations r
                  JOIN competitions c ON c.id = r.competition_id
                  WHERE c.organizer_id = $1) AS total_registrations,
                (SELECT COUNT(*) FROM registrations r
                  JOIN competitions c ON c.id = r.competition_id
                  WHERE c.organizer_id = $1 AND r.status = 'PENDING') AS pending_registrations
            "#,
        )
        .bind(organizer_id)
        .fetch_one(self.pool)
        .await?;

        let recent_registrations = sqlx::query_as::<_, RecentRegistration>(
            r#"
            SELECT r.id, r.status, r.created_at, c.title AS competition_title, u.name AS user_name
            FROM registrations r
            JOIN competitions c ON c.id = r.competition_id
            JOIN users u ON u.id = r.user_id
            WHERE c.organizer_id = $1
            ORDER BY r.created_at DESC
            LIMIT 5
            "#,
        )
        .bind(organizer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(OrganizerStats {
            total_competitions: totals.total_competitions,
            active_competitions: totals.active_competitions,
            total_registrations: totals.total_registrations,
            pending_registrations: totals.pending_registrations,
            recent_registrations,
        })
    }
}
