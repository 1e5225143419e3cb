//! Event registration model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::errors::CampusWallError;

/// Lifecycle of a registration: canceled (0), registered (1), attended (2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(into = "i16", try_from = "i16")]
#[repr(i16)]
pub enum RegistrationStatus {
    Canceled = 0,
    Registered = 1,
    Attended = 2,
}

impl RegistrationStatus {
    pub fn code(self) -> i16 {
        self as i16
    }

    /// Active registrations hold a slot and count towards `current_participants`
    pub fn is_active(self) -> bool {
        matches!(self, RegistrationStatus::Registered | RegistrationStatus::Attended)
    }

    /// Transitions reachable from user-facing operations
    ///
    /// registered -> canceled (cancel), registered -> attended (check-in),
    /// canceled -> registered (re-register). Attended is terminal here; only
    /// the administrative override may leave it.
    pub fn transition(self, to: RegistrationStatus) -> Result<RegistrationStatus, CampusWallError> {
        use RegistrationStatus::*;
        match (self, to) {
            (Registered, Canceled) | (Registered, Attended) | (Canceled, Registered) => Ok(to),
            _ => Err(CampusWallError::InvalidStatus {
                from: self.to_string(),
                to: to.to_string(),
            }),
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RegistrationStatus::Canceled => "canceled",
            RegistrationStatus::Registered => "registered",
            RegistrationStatus::Attended => "attended",
        };
        f.write_str(label)
    }
}

impl From<RegistrationStatus> for i16 {
    fn from(status: RegistrationStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i16> for RegistrationStatus {
    type Error = CampusWallError;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(RegistrationStatus::Canceled),
            1 => Ok(RegistrationStatus::Registered),
            2 => Ok(RegistrationStatus::Attended),
            other => Err(CampusWallError::InvalidInput(format!("Unknown registration status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EventRegistration {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub status: RegistrationStatus,
    pub form_data: Option<serde_json::Value>,
    pub registered_at: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub check_in_time: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub form_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CancelRegistrationRequest {
    #[validate(length(max = 500, message = "reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRegistrationStatusRequest {
    pub status: RegistrationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchUpdateStatusRequest {
    #[validate(length(min = 1, max = 500, message = "ids must contain 1-500 entries"))]
    pub ids: Vec<i64>,
    pub status: RegistrationStatus,
}

/// Query filter for registration listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationFilter {
    pub status: Option<i16>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Caller-facing view of a user's registration for one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationStatusView {
    pub is_registered: bool,
    pub status: Option<RegistrationStatus>,
    pub registered_at: Option<DateTime<Utc>>,
    pub form_data: Option<serde_json::Value>,
}

impl RegistrationStatusView {
    pub fn from_registration(registration: Option<&EventRegistration>) -> Self {
        match registration {
            Some(r) => Self {
                is_registered: r.status.is_active(),
                status: Some(r.status),
                registered_at: Some(r.registered_at),
                form_data: r.form_data.clone(),
            },
            None => Self {
                is_registered: false,
                status: None,
                registered_at: None,
                form_data: None,
            },
        }
    }
}

/// Per-status row counts for an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationCounts {
    pub canceled: i64,
    pub registered: i64,
    pub attended: i64,
}

impl RegistrationCounts {
    pub fn total(&self) -> i64 {
        self.canceled + self.registered + self.attended
    }

    pub fn active(&self) -> i64 {
        self.registered + self.attended
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationStats {
    pub event_id: i64,
    pub total: i64,
    pub registered: i64,
    pub attended: i64,
    pub canceled: i64,
    pub max_participants: Option<i32>,
    pub current_participants: i32,
    pub remaining_slots: Option<i32>,
    /// attended / (registered + attended), 0 when nobody holds a slot
    pub attendance_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_path_transitions() {
        use RegistrationStatus::*;
        assert!(Registered.transition(Canceled).is_ok());
        assert!(Registered.transition(Attended).is_ok());
        assert!(Canceled.transition(Registered).is_ok());

        assert!(Attended.transition(Registered).is_err());
        assert!(Attended.transition(Canceled).is_err());
        assert!(Canceled.transition(Attended).is_err());
        assert!(Registered.transition(Registered).is_err());
    }

    #[test]
    fn test_active_statuses() {
        assert!(!RegistrationStatus::Canceled.is_active());
        assert!(RegistrationStatus::Registered.is_active());
        assert!(RegistrationStatus::Attended.is_active());
    }

    #[test]
    fn test_status_view_for_canceled_registration() {
        let now = Utc::now();
        let registration = EventRegistration {
            id: 1,
            event_id: 2,
            user_id: 3,
            status: RegistrationStatus::Canceled,
            form_data: None,
            registered_at: now,
            canceled_at: Some(now),
            cancel_reason: None,
            check_in_time: None,
            updated_at: now,
        };
        let view = RegistrationStatusView::from_registration(Some(&registration));
        assert!(!view.is_registered);
        assert_eq!(view.status, Some(RegistrationStatus::Canceled));

        let empty = RegistrationStatusView::from_registration(None);
        assert!(!empty.is_registered);
        assert!(empty.status.is_none());
    }

    #[test]
    fn test_counts() {
        let counts = RegistrationCounts { canceled: 2, registered: 3, attended: 1 };
        assert_eq!(counts.total(), 6);
        assert_eq!(counts.active(), 4);
    }
}
