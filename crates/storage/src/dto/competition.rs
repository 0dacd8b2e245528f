use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{Competition, CompetitionStatus, CompetitionType, Schedule, TeamStatus};

/// Request payload for creating a new competition
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCompetitionRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Title must be between 1 and 255 characters"
    ))]
    pub title: String,

    pub competition_type: CompetitionType,

    #[validate(length(min = 1, max = 255, message = "Discipline is required"))]
    pub discipline: String,

    #[validate(length(max = 10000))]
    pub description: Option<String>,

    #[validate(length(max = 10000))]
    pub rules: Option<String>,

    #[validate(length(max = 2000))]
    pub prizes: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Region is required"))]
    pub region: String,

    pub registration_start: DateTime<Utc>,
    pub registration_end: DateTime<Utc>,
    pub event_start: DateTime<Utc>,
    pub event_end: DateTime<Utc>,

    #[validate(range(min = 1, message = "max_participants must be positive"))]
    pub max_participants: Option<i32>,

    /// DRAFT (default) or REGISTRATION_OPEN when moderation is skipped
    pub initial_status: Option<CompetitionStatus>,

    /// Only honoured for administrators creating on behalf of an organizer
    pub organizer_id: Option<String>,
}

impl CreateCompetitionRequest {
    pub fn schedule(&self) -> Schedule {
        Schedule {
            registration_start: self.registration_start,
            registration_end: self.registration_end,
            event_start: self.event_start,
            event_end: self.event_end,
        }
    }
}

/// Request payload for updating an existing competition. Status changes go
/// through the transition endpoint instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCompetitionRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    pub competition_type: Option<CompetitionType>,

    #[validate(length(min = 1, max = 255))]
    pub discipline: Option<String>,

    #[validate(length(max = 10000))]
    pub description: Option<String>,

    #[validate(length(max = 10000))]
    pub rules: Option<String>,

    #[validate(length(max = 2000))]
    pub prizes: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub region: Option<String>,

    pub registration_start: Option<DateTime<Utc>>,
    pub registration_end: Option<DateTime<Utc>>,
    pub event_start: Option<DateTime<Utc>>,
    pub event_end: Option<DateTime<Utc>>,

    #[validate(range(min = 1))]
    pub max_participants: Option<i32>,

    /// Set to true to lift the participant limit
    #[serde(default)]
    pub unlimited_participants: bool,
}

impl UpdateCompetitionRequest {
    /// Schedule obtained by overlaying this request on `existing`
    pub fn merged_schedule(&self, existing: &Competition) -> Schedule {
        Schedule {
            registration_start: self.registration_start.unwrap_or(existing.registration_start),
            registration_end: self.registration_end.unwrap_or(existing.registration_end),
            event_start: self.event_start.unwrap_or(existing.event_start),
            event_end: self.event_end.unwrap_or(existing.event_end),
        }
    }

    pub fn merged_max_participants(&self, existing: &Competition) -> Option<i32> {
        if self.unlimited_participants {
            None
        } else {
            self.max_participants.or(existing.max_participants)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransitionRequest {
    pub status: CompetitionStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CompetitionFilter {
    #[serde(rename = "type")]
    pub competition_type: Option<CompetitionType>,
    pub region: Option<String>,
    pub status: Option<CompetitionStatus>,
    /// Case-insensitive match on title or description
    pub search: Option<String>,
    pub organizer_id: Option<String>,
}

/// Response containing competition details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompetitionResponse {
    pub id: String,
    pub title: String,
    pub competition_type: CompetitionType,
    pub discipline: String,
    pub description: Option<String>,
    pub rules: Option<String>,
    pub prizes: Option<String>,
    pub region: String,
    pub registration_start: DateTime<Utc>,
    pub registration_end: DateTime<Utc>,
    pub event_start: DateTime<Utc>,
    pub event_end: DateTime<Utc>,
    pub max_participants: Option<i32>,
    pub current_participants: i32,
    pub status: CompetitionStatus,
    pub organizer_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Competition> for CompetitionResponse {
    fn from(comp: Competition) -> Self {
        Self {
            id: comp.id,
            title: comp.title,
            competition_type: comp.competition_type,
            discipline: comp.discipline,
            description: comp.description,
            rules: comp.rules,
            prizes: comp.prizes,
            region: comp.region,
            registration_start: comp.registration_start,
            registration_end: comp.registration_end,
            event_start: comp.event_start,
            event_end: comp.event_end,
            max_participants: comp.max_participants,
            current_participants: comp.current_participants,
            status: comp.status,
            organizer_id: comp.organizer_id,
            created_at: comp.created_at,
            updated_at: comp.updated_at,
        }
    }
}

/// Row of the public competition listing
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct CompetitionListItem {
    pub id: String,
    pub title: String,
    pub competition_type: CompetitionType,
    pub discipline: String,
    pub region: String,
    pub registration_start: DateTime<Utc>,
    pub registration_end: DateTime<Utc>,
    pub event_start: DateTime<Utc>,
    pub event_end: DateTime<Utc>,
    pub max_participants: Option<i32>,
    pub current_participants: i32,
    pub status: CompetitionStatus,
    pub organizer_id: String,
    pub organizer_name: String,
    pub registrations_count: i64,
    pub teams_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct OrganizerInfo {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct TeamSummary {
    pub id: String,
    pub name: String,
    pub status: TeamStatus,
    pub captain_id: String,
    pub captain_name: String,
    pub member_count: i64,
}

/// Competition with organizer and teams
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompetitionDetailResponse {
    #[serde(flatten)]
    pub competition: CompetitionResponse,
    pub organizer: OrganizerInfo,
    pub teams: Vec<TeamSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_request() -> CreateCompetitionRequest {
        let now = Utc::now();
        CreateCompetitionRequest {
            title: "Spring Hackathon".to_string(),
            competition_type: CompetitionType::Regional,
            discipline: "Product".to_string(),
            description: None,
            rules: None,
            prizes: None,
            region: "Kazan".to_string(),
            registration_start: now,
            registration_end: now + Duration::days(7),
            event_start: now + Duration::days(8),
            event_end: now + Duration::days(9),
            max_participants: Some(30),
            initial_status: None,
            organizer_id: None,
        }
    }

    #[test]
    fn test_valid_create_request() {
        let req = create_request();
        assert!(req.validate().is_ok());
        assert!(req.schedule().validate().is_ok());
    }

    #[test]
    fn test_empty_title_rejected() {
        let req = CreateCompetitionRequest {
            title: String::new(),
            ..create_request()
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let req = CreateCompetitionRequest {
            max_participants: Some(0),
            ..create_request()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_competition_type_wire_format() {
        let json = serde_json::to_string(&CompetitionType::Federal).unwrap();
        assert_eq!(json, "\"FEDERAL\"");
        let status: CompetitionStatus = serde_json::from_str("\"REGISTRATION_OPEN\"").unwrap();
        assert_eq!(status, CompetitionStatus::RegistrationOpen);
    }

    fn assert_row_type<T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>>() {}

    #[test]
    fn test_detail_parts_decode_from_rows() {
        assert_row_type::<OrganizerInfo>();
        assert_row_type::<TeamSummary>();
    }
}
