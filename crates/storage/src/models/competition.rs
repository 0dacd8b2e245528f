use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::{Result, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "competition_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompetitionType {
    Open,
    Regional,
    Federal,
}

/// Lifecycle status of a competition.
///
/// Statuses only move forward along
/// `DRAFT -> MODERATION -> REGISTRATION_OPEN -> REGISTRATION_CLOSED -> IN_PROGRESS -> COMPLETED`,
/// with `CANCELLED` reachable from every non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "competition_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompetitionStatus {
    Draft,
    Moderation,
    RegistrationOpen,
    RegistrationClosed,
    InProgress,
    Completed,
    Cancelled,
}

/// Forward edges of the lifecycle. Cancellation is handled separately.
const FORWARD_EDGES: &[(CompetitionStatus, CompetitionStatus)] = &[
    (CompetitionStatus::Draft, CompetitionStatus::Moderation),
    (CompetitionStatus::Moderation, CompetitionStatus::RegistrationOpen),
    (
        CompetitionStatus::RegistrationOpen,
        CompetitionStatus::RegistrationClosed,
    ),
    (CompetitionStatus::RegistrationClosed, CompetitionStatus::InProgress),
    (CompetitionStatus::InProgress, CompetitionStatus::Completed),
];

impl CompetitionStatus {
    pub const ALL: [CompetitionStatus; 7] = [
        Self::Draft,
        Self::Moderation,
        Self::RegistrationOpen,
        Self::RegistrationClosed,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Moderation => "MODERATION",
            Self::RegistrationOpen => "REGISTRATION_OPEN",
            Self::RegistrationClosed => "REGISTRATION_CLOSED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn can_transition_to(&self, target: CompetitionStatus) -> bool {
        if target == Self::Cancelled {
            return !self.is_terminal();
        }

        FORWARD_EDGES.contains(&(*self, target))
    }

    /// Returns the target status if the edge exists, otherwise `InvalidTransition`.
    pub fn transition_to(&self, target: CompetitionStatus) -> Result<CompetitionStatus> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(StorageError::InvalidTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// Statuses a competition may be created in
    pub fn is_initial(&self) -> bool {
        matches!(self, Self::Draft | Self::RegistrationOpen)
    }
}

impl std::fmt::Display for CompetitionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Competition {
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

/// The four dates governing a competition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub registration_start: DateTime<Utc>,
    pub registration_end: DateTime<Utc>,
    pub event_start: DateTime<Utc>,
    pub event_end: DateTime<Utc>,
}

impl Schedule {
    /// Checks `registration_start <= registration_end <= event_start <= event_end`.
    pub fn validate(&self) -> Result<()> {
        if self.registration_end < self.registration_start {
            return Err(StorageError::InvalidDateRange(
                "registration_end must not be before registration_start",
            ));
        }
        if self.event_start < self.registration_end {
            return Err(StorageError::InvalidDateRange(
                "event_start must not be before registration_end",
            ));
        }
        if self.event_end < self.event_start {
            return Err(StorageError::InvalidDateRange(
                "event_end must not be before event_start",
            ));
        }
        Ok(())
    }

    pub fn registration_window_contains(&self, instant: DateTime<Utc>) -> bool {
        self.registration_start <= instant && instant <= self.registration_end
    }
}

impl Competition {
    pub fn schedule(&self) -> Schedule {
        Schedule {
            registration_start: self.registration_start,
            registration_end: self.registration_end,
            event_start: self.event_start,
            event_end: self.event_end,
        }
    }

    pub fn has_free_slot(&self) -> bool {
        self.max_participants
            .is_none_or(|max| self.current_participants < max)
    }

    /// Status and date window, checked before anything about the caller.
    ///
    /// Status comes first, so a closed competition always reports
    /// `RegistrationClosed` even outside its window.
    pub fn check_registration_open(&self, now: DateTime<Utc>) -> Result<()> {
        if self.status != CompetitionStatus::RegistrationOpen {
            return Err(StorageError::RegistrationClosed(format!(
                "competition status is {}",
                self.status
            )));
        }

        if !self.schedule().registration_window_contains(now) {
            return Err(StorageError::RegistrationClosed(
                "outside of the registration window".to_string(),
            ));
        }

        Ok(())
    }

    /// Admission preconditions evaluated against a locked competition row:
    /// open for registration, then free capacity.
    pub fn check_admission(&self, now: DateTime<Utc>) -> Result<()> {
        self.check_registration_open(now)?;

        if !self.has_free_slot() {
            return Err(StorageError::CapacityExceeded);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn competition(status: CompetitionStatus, max: Option<i32>, current: i32) -> Competition {
        let now = Utc::now();
        Competition {
            id: "comp_test".to_string(),
            title: "City Cup".to_string(),
            competition_type: CompetitionType::Open,
            discipline: "Programming".to_string(),
            description: None,
            rules: None,
            prizes: None,
            region: "Moscow".to_string(),
            registration_start: now - Duration::days(1),
            registration_end: now + Duration::days(1),
            event_start: now + Duration::days(2),
            event_end: now + Duration::days(3),
            max_participants: max,
            current_participants: current,
            status,
            organizer_id: "usr_org".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_forward_edges_are_legal() {
        use CompetitionStatus::*;
        assert!(Draft.can_transition_to(Moderation));
        assert!(Moderation.can_transition_to(RegistrationOpen));
        assert!(RegistrationOpen.can_transition_to(RegistrationClosed));
        assert!(RegistrationClosed.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
    }

    #[test]
    fn test_only_listed_edges_are_legal() {
        use CompetitionStatus::*;
        let legal = [
            (Draft, Moderation),
            (Moderation, RegistrationOpen),
            (RegistrationOpen, RegistrationClosed),
            (RegistrationClosed, InProgress),
            (InProgress, Completed),
            (Draft, Cancelled),
            (Moderation, Cancelled),
            (RegistrationOpen, Cancelled),
            (RegistrationClosed, Cancelled),
            (InProgress, Cancelled),
        ];

        for from in CompetitionStatus::ALL {
            for to in CompetitionStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_terminal_statuses_cannot_be_cancelled() {
        use CompetitionStatus::*;
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cancelled));
        assert!(matches!(
            Completed.transition_to(Cancelled),
            Err(StorageError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_no_backward_edges() {
        use CompetitionStatus::*;
        assert!(!RegistrationClosed.can_transition_to(RegistrationOpen));
        assert!(!RegistrationOpen.can_transition_to(Draft));
        assert!(!Draft.can_transition_to(RegistrationOpen));
    }

    #[test]
    fn test_schedule_must_be_ordered() {
        let now = Utc::now();
        let ok = Schedule {
            registration_start: now,
            registration_end: now,
            event_start: now,
            event_end: now,
        };
        assert!(ok.validate().is_ok());

        let bad = Schedule {
            event_start: now - Duration::hours(1),
            ..ok
        };
        assert!(matches!(
            bad.validate(),
            Err(StorageError::InvalidDateRange(_))
        ));

        let bad = Schedule {
            registration_start: now + Duration::hours(1),
            registration_end: now,
            event_start: now + Duration::hours(2),
            event_end: now + Duration::hours(3),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_admission_requires_open_status_first() {
        let comp = competition(CompetitionStatus::RegistrationClosed, Some(1), 1);
        assert!(matches!(
            comp.check_admission(Utc::now()),
            Err(StorageError::RegistrationClosed(_))
        ));
    }

    #[test]
    fn test_admission_outside_window() {
        let comp = competition(CompetitionStatus::RegistrationOpen, None, 0);
        let late = comp.registration_end + Duration::seconds(1);
        assert!(matches!(
            comp.check_admission(late),
            Err(StorageError::RegistrationClosed(_))
        ));
    }

    #[test]
    fn test_admission_capacity() {
        let full = competition(CompetitionStatus::RegistrationOpen, Some(2), 2);
        assert!(matches!(
            full.check_admission(Utc::now()),
            Err(StorageError::CapacityExceeded)
        ));

        let open = competition(CompetitionStatus::RegistrationOpen, Some(2), 1);
        assert!(open.check_admission(Utc::now()).is_ok());

        let unbounded = competition(CompetitionStatus::RegistrationOpen, None, 10_000);
        assert!(unbounded.check_admission(Utc::now()).is_ok());
    }

    #[test]
    fn test_registration_open_ignores_capacity() {
        let full = competition(CompetitionStatus::RegistrationOpen, Some(2), 2);
        assert!(full.check_registration_open(Utc::now()).is_ok());

        let closed = competition(CompetitionStatus::RegistrationClosed, Some(2), 2);
        assert!(matches!(
            closed.check_registration_open(Utc::now()),
            Err(StorageError::RegistrationClosed(_))
        ));
    }
}
