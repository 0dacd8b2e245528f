use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::RegistrationStatus;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct OrganizerScope {
    /// Administrators may inspect another organizer
    pub organizer_id: Option<String>,
    pub competition_id: Option<String>,
    pub status: Option<RegistrationStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct RecentRegistration {
    pub id: String,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub competition_title: String,
    pub user_name: String,
}

/// Active competitions are those open for registration or in progress
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrganizerStats {
    pub total_competitions: i64,
    pub active_competitions: i64,
    pub total_registrations: i64,
    pub pending_registrations: i64,
    pub recent_registrations: Vec<RecentRegistration>,
}
