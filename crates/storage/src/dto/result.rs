use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::models::CompetitionResult;

/// A placement for either a single participant or a team
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_subject"))]
pub struct RecordResultRequest {
    pub user_id: Option<String>,
    pub team_id: Option<String>,

    #[validate(range(min = 1))]
    pub place: Option<i32>,

    pub score: Option<Decimal>,

    #[validate(length(max = 64))]
    pub time_spent: Option<String>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

fn validate_subject(req: &RecordResultRequest) -> Result<(), ValidationError> {
    match (&req.user_id, &req.team_id) {
        (Some(_), None) | (None, Some(_)) => Ok(()),
        _ => Err(ValidationError::new("exactly_one_of_user_or_team")),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResultResponse {
    pub id: String,
    pub competition_id: String,
    pub user_id: Option<String>,
    pub team_id: Option<String>,
    pub place: Option<i32>,
    pub score: Option<Decimal>,
    pub time_spent: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CompetitionResult> for ResultResponse {
    fn from(r: CompetitionResult) -> Self {
        Self {
            id: r.id,
            competition_id: r.competition_id,
            user_id: r.user_id,
            team_id: r.team_id,
            place: r.place,
            score: r.score,
            time_spent: r.time_spent,
            notes: r.notes,
            created_at: r.created_at,
        }
    }
}
