use sqlx::{PgPool, Postgres, QueryBuilder};

use super::Tx;
use crate::dto::common::PageParams;
use crate::dto::competition::{
    CompetitionDetailResponse, CompetitionFilter, CompetitionListItem, CreateCompetitionRequest,
    OrganizerInfo, TeamSummary, UpdateCompetitionRequest,
};
use crate::error::{Result, StorageError};
use crate::models::{Competition, CompetitionStatus, IdKind, new_id};

const LIST_SELECT: &str = r#"
    SELECT c.id, c.title, c.competition_type, c.discipline, c.region,
           c.registration_start, c.registration_end, c.event_start, c.event_end,
           c.max_participants, c.current_participants, c.status, c.organizer_id,
           u.name AS organizer_name,
           (SELECT COUNT(*) FROM registrations r
             WHERE r.competition_id = c.id AND r.status <> 'CANCELLED') AS registrations_count,
           (SELECT COUNT(*) FROM teams t WHERE t.competition_id = c.id) AS teams_count
    FROM competitions c
    JOIN users u ON u.id = c.organizer_id
    WHERE TRUE
"#;

/// Repository for Competition database operations
pub struct CompetitionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CompetitionRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List competitions matching `filter`, soonest event first
    pub async fn list(
        &self,
        filter: &CompetitionFilter,
        page: PageParams,
    ) -> Result<(Vec<CompetitionListItem>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM competitions c WHERE TRUE",
        );
        push_competition_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(LIST_SELECT);
        push_competition_filter(&mut query, filter);
        query
            .push(" ORDER BY c.event_start ASC, c.created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items = query
            .build_query_as::<CompetitionListItem>()
            .fetch_all(self.pool)
            .await?;

        Ok((items, total))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Competition> {
        sqlx::query_as::<_, Competition>("SELECT * FROM competitions WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound("Competition"))
    }

    /// Competition with its organizer and teams
    pub async fn find_detail(&self, id: &str) -> Result<CompetitionDetailResponse> {
        let competition = self.find_by_id(id).await?;

        let organizer = sqlx::query_as::<_, OrganizerInfo>(
            "SELECT id, name, email FROM users WHERE id = $1",
        )
        .bind(&competition.organizer_id)
        .fetch_one(self.pool)
        .await?;

        let teams = sqlx::query_as::<_, TeamSummary>(
            r#"
            SELECT t.id, t.name, t.status, t.captain_id, u.name AS captain_name,
                   (SELECT COUNT(*) FROM team_members m WHERE m.team_id = t.id) AS member_count
            FROM teams t
            JOIN users u ON u.id = t.captain_id
            WHERE t.competition_id = $1
            ORDER BY t.created_at
            "#,
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(CompetitionDetailResponse {
            competition: competition.into(),
            organizer,
            teams,
        })
    }

    pub async fn create(
        &self,
        req: &CreateCompetitionRequest,
        organizer_id: &str,
        status: CompetitionStatus,
    ) -> Result<Competition> {
        let competition = sqlx::query_as::<_, Competition>(
            r#"
            INSERT INTO competitions (
                id, title, competition_type, discipline, description, rules, prizes,
                region, registration_start, registration_end, event_start, event_end,
                max_participants, status, organizer_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(new_id(IdKind::Competition))
        .bind(&req.title)
        .bind(req.competition_type)
        .bind(&req.discipline)
        .bind(&req.description)
        .bind(&req.rules)
        .bind(&req.prizes)
        .bind(&req.region)
        .bind(req.registration_start)
        .bind(req.registration_end)
        .bind(req.event_start)
        .bind(req.event_end)
        .bind(req.max_participants)
        .bind(status)
        .bind(organizer_id)
        .fetch_one(self.pool)
        .await
        .map_err(schedule_violation)?;

        Ok(competition)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM competitions WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound("Competition"));
        }

        Ok(())
    }
}

/// Locks the competition row for the rest of the transaction.
///
/// Every path that touches registrations, teams or the participant counter
/// takes this lock first, so locks are always acquired in the same order.
/// `NO KEY UPDATE` leaves foreign-key checks from child inserts unblocked.
pub async fn lock(tx: &mut Tx<'_>, id: &str) -> Result<Competition> {
    sqlx::query_as::<_, Competition>("SELECT * FROM competitions WHERE id = $1 FOR NO KEY UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StorageError::NotFound("Competition"))
}

/// Takes one participant slot.
///
/// Matches zero rows when registration is no longer open or the competition
/// is full, so the capacity check and the increment are a single statement.
pub async fn claim_slot(tx: &mut Tx<'_>, id: &str) -> Result<Option<Competition>> {
    let competition = sqlx::query_as::<_, Competition>(
        r#"
        UPDATE competitions
        SET current_participants = current_participants + 1, updated_at = NOW()
        WHERE id = $1
          AND status = 'REGISTRATION_OPEN'
          AND (max_participants IS NULL OR current_participants < max_participants)
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(competition)
}

/// Gives back one participant slot, never going below zero
pub async fn release_slot(tx: &mut Tx<'_>, id: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE competitions
        SET current_participants = GREATEST(current_participants - 1, 0), updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Locks, in id order, every competition the user holds a registration in
pub async fn lock_for_participant(tx: &mut Tx<'_>, user_id: &str) -> Result<Vec<String>> {
    let ids = sqlx::query_scalar::<_, String>(
        r#"
        SELECT id FROM competitions
        WHERE id IN (SELECT competition_id FROM registrations WHERE user_id = $1)
        ORDER BY id
        FOR NO KEY UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(ids)
}

/// Gives back every slot held by the user's registrations, returning how
/// many were released
pub async fn release_participant_slots(tx: &mut Tx<'_>, user_id: &str) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE competitions c
        SET current_participants = GREATEST(c.current_participants - held.slots, 0),
            updated_at = NOW()
        FROM (
            SELECT competition_id, COUNT(*)::INT AS slots
            FROM registrations
            WHERE user_id = $1 AND status IN ('PENDING', 'CONFIRMED')
            GROUP BY competition_id
        ) held
        WHERE c.id = held.competition_id
        "#,
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

pub async fn set_status(
    tx: &mut Tx<'_>,
    id: &str,
    status: CompetitionStatus,
) -> Result<Competition> {
    let competition = sqlx::query_as::<_, Competition>(
        "UPDATE competitions SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_one(&mut **tx)
    .await?;

    Ok(competition)
}

pub async fn reset_participants(tx: &mut Tx<'_>, id: &str) -> Result<Competition> {
    let competition = sqlx::query_as::<_, Competition>(
        r#"
        UPDATE competitions
        SET current_participants = 0, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(competition)
}

/// Writes a partial update whose schedule and capacity were already merged
pub async fn apply_update(
    tx: &mut Tx<'_>,
    id: &str,
    req: &UpdateCompetitionRequest,
    max_participants: Option<i32>,
) -> Result<Competition> {
    sqlx::query_as::<_, Competition>(
        r#"
        UPDATE competitions
        SET title = COALESCE($2, title),
            competition_type = COALESCE($3, competition_type),
            discipline = COALESCE($4, discipline),
            description = COALESCE($5, description),
            rules = COALESCE($6, rules),
            prizes = COALESCE($7, prizes),
            region = COALESCE($8, region),
            registration_start = COALESCE($9, registration_start),
            registration_end = COALESCE($10, registration_end),
            event_start = COALESCE($11, event_start),
            event_end = COALESCE($12, event_end),
            max_participants = $13,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&req.title)
    .bind(req.competition_type)
    .bind(&req.discipline)
    .bind(&req.description)
    .bind(&req.rules)
    .bind(&req.prizes)
    .bind(&req.region)
    .bind(req.registration_start)
    .bind(req.registration_end)
    .bind(req.event_start)
    .bind(req.event_end)
    .bind(max_participants)
    .fetch_one(&mut **tx)
    .await
    .map_err(schedule_violation)
}

fn push_competition_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &CompetitionFilter) {
    if let Some(kind) = filter.competition_type {
        query.push(" AND c.competition_type = ").push_bind(kind);
    }
    if let Some(region) = filter.region.as_deref().filter(|r| !r.is_empty()) {
        query.push(" AND c.region = ").push_bind(region.to_string());
    }
    if let Some(status) = filter.status {
        query.push(" AND c.status = ").push_bind(status);
    }
    if let Some(organizer_id) = filter.organizer_id.as_deref() {
        query.push(" AND c.organizer_id = ").push_bind(organizer_id.to_string());
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        query
            .push(" AND (c.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn schedule_violation(e: sqlx::Error) -> StorageError {
    let err = StorageError::from(e);
    if !err.is_check_violation() {
        return err;
    }

    let mapped = match err.constraint() {
        Some("competitions_schedule_ordered") => Some(StorageError::InvalidDateRange(
            "dates must be in chronological order",
        )),
        Some("competitions_max_participants_positive") => Some(StorageError::Validation(
            "max_participants must be positive".to_string(),
        )),
        _ => None,
    };
    mapped.unwrap_or(err)
}
