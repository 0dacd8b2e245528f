use thiserror::Error;

use crate::models::{CompetitionStatus, RegistrationStatus, TeamStatus};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("User is already registered for this competition")]
    AlreadyRegistered,

    #[error("Competition has reached its maximum number of participants")]
    CapacityExceeded,

    #[error("Team has reached its maximum size")]
    TeamFull,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Registration is closed: {0}")]
    RegistrationClosed(String),

    #[error("Cannot move competition from {from} to {to}")]
    InvalidTransition {
        from: CompetitionStatus,
        to: CompetitionStatus,
    },

    #[error("Cannot move registration from {from} to {to}")]
    InvalidRegistrationTransition {
        from: RegistrationStatus,
        to: RegistrationStatus,
    },

    #[error("Cannot move team from {from} to {to}")]
    InvalidTeamTransition { from: TeamStatus, to: TeamStatus },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Coarse classification callers use to pick a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    InvalidState,
    Validation,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::InvalidState => "invalid_state",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::AlreadyRegistered
            | Self::CapacityExceeded
            | Self::TeamFull
            | Self::Conflict(_) => ErrorKind::Conflict,
            Self::RegistrationClosed(_)
            | Self::InvalidTransition { .. }
            | Self::InvalidRegistrationTransition { .. }
            | Self::InvalidTeamTransition { .. }
            | Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::InvalidDateRange(_) | Self::Validation(_) => ErrorKind::Validation,
            Self::Database(_) | Self::Migration(_) => ErrorKind::Internal,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        )
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23503")
        )
    }

    pub fn is_check_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23514")
        )
    }

    /// Name of the violated constraint, when the database reported one
    pub fn constraint(&self) -> Option<&str> {
        match self {
            StorageError::Database(sqlx::Error::Database(e)) => e.constraint(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_failures_are_conflicts() {
        assert_eq!(StorageError::AlreadyRegistered.kind(), ErrorKind::Conflict);
        assert_eq!(StorageError::CapacityExceeded.kind(), ErrorKind::Conflict);
        assert_eq!(StorageError::TeamFull.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_closed_registration_is_invalid_state() {
        let err = StorageError::RegistrationClosed("status is REGISTRATION_CLOSED".to_string());
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let err = StorageError::InvalidTransition {
            from: CompetitionStatus::Completed,
            to: CompetitionStatus::Draft,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.to_string(), "Cannot move competition from COMPLETED to DRAFT");
    }

    #[test]
    fn test_date_range_is_validation() {
        let err = StorageError::InvalidDateRange("event_end is before event_start");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_row_not_found_is_internal() {
        let err = StorageError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!err.is_unique_violation());
    }
}
