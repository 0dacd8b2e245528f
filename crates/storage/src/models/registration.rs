use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::{Result, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "registration_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
}

impl RegistrationStatus {
    pub const ALL: [RegistrationStatus; 4] = [
        Self::Pending,
        Self::Confirmed,
        Self::Rejected,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Whether a registration in this status counts towards `current_participants`
    pub fn holds_slot(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    pub fn can_transition_to(&self, target: RegistrationStatus) -> bool {
        use RegistrationStatus::*;
        matches!(
            (self, target),
            (Pending, Confirmed)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Rejected, Cancelled)
        )
    }

    pub fn transition_to(&self, target: RegistrationStatus) -> Result<RegistrationStatus> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(StorageError::InvalidRegistrationTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// Change applied to the competition counter when moving to `target`
    pub fn slot_delta(&self, target: RegistrationStatus) -> i32 {
        match (self.holds_slot(), target.holds_slot()) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Registration {
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
