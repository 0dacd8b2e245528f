use sqlx::PgPool;

use crate::dto::result::RecordResultRequest;
use crate::dto::user::CreateAchievementRequest;
use crate::error::{Result, StorageError};
use crate::models::{Achievement, CompetitionResult, IdKind, new_id};

pub struct ResultRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ResultRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Results ordered by place, unplaced entries last
    pub async fn list(&self, competition_id: &str) -> Result<Vec<CompetitionResult>> {
        let results = sqlx::query_as::<_, CompetitionResult>(
            r#"
            SELECT * FROM results
            WHERE competition_id = $1
            ORDER BY place ASC NULLS LAST, created_at
            "#,
        )
        .bind(competition_id)
        .fetch_all(self.pool)
        .await?;

        Ok(results)
    }

    pub async fn create(
        &self,
        competition_id: &str,
        req: &RecordResultRequest,
    ) -> Result<CompetitionResult> {
        sqlx::query_as::<_, CompetitionResult>(
            r#"
            INSERT INTO results (id, competition_id, team_id, user_id, place, score, time_spent, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(new_id(IdKind::Result))
        .bind(competition_id)
        .bind(&req.team_id)
        .bind(&req.user_id)
        .bind(req.place)
        .bind(req.score)
        .bind(&req.time_spent)
        .bind(&req.notes)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_foreign_key_violation() {
                StorageError::Validation("unknown user or team".to_string())
            } else {
                err
            }
        })
    }
}

pub struct AchievementRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AchievementRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Achievement>> {
        let achievements = sqlx::query_as::<_, Achievement>(
            "SELECT * FROM achievements WHERE user_id = $1 ORDER BY date DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(achievements)
    }

    pub async fn create(&self, user_id: &str, req: &CreateAchievementRequest) -> Result<Achievement> {
        sqlx::query_as::<_, Achievement>(
            r#"
            INSERT INTO achievements (id, user_id, title, place, points, date, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new_id(IdKind::Achievement))
        .bind(user_id)
        .bind(&req.title)
        .bind(req.place)
        .bind(req.points)
        .bind(req.date)
        .bind(&req.description)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_foreign_key_violation() {
                StorageError::NotFound("User")
            } else {
                err
            }
        })
    }
}
