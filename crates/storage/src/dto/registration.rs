use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{PaymentStatus, Registration, RegistrationStatus};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateRegistrationRequest {
    #[validate(length(min = 1, message = "competition_id is required"))]
    pub competition_id: String,

    /// Defaults to the caller
    pub user_id: Option<String>,

    pub team_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateRegistrationStatusRequest {
    pub status: RegistrationStatus,
    pub payment_status: Option<PaymentStatus>,
    pub payment_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RegistrationFilter {
    pub user_id: Option<String>,
    pub competition_id: Option<String>,
    pub status: Option<RegistrationStatus>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RegistrationCheckQuery {
    pub competition_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistrationCheckResponse {
    pub is_registered: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegistrationResponse {
    pub id: String,
    pub competition_id: String,
    pub user_id: String,
    pub team_id: Option<String>,
    pub status: RegistrationStatus,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Registration> for RegistrationResponse {
    fn from(reg: Registration) -> Self {
        Self {
            id: reg.id,
            competition_id: reg.competition_id,
            user_id: reg.user_id,
            team_id: reg.team_id,
            status: reg.status,
            payment_status: reg.payment_status,
            payment_id: reg.payment_id,
            created_at: reg.created_at,
            updated_at: reg.updated_at,
        }
    }
}

/// Registration joined with its competition, team and participant
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct RegistrationDetail {
    pub id: String,
    pub competition_id: String,
    pub competition_title: String,
    pub competition_event_start: DateTime<Utc>,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub team_id: Option<String>,
    pub team_name: Option<String>,
    pub status: RegistrationStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
