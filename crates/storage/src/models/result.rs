use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Placement of a participant or team in a completed competition
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CompetitionResult {
    pub id: String,
    pub competition_id: String,
    pub team_id: Option<String>,
    pub user_id: Option<String>,
    pub place: Option<i32>,
    pub score: Option<Decimal>,
    pub time_spent: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Achievement {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub place: i32,
    pub points: i32,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
