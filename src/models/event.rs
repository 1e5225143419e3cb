//! Event model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::errors::CampusWallError;

/// Lifecycle of an event
///
/// Stored as SMALLINT and serialized as its numeric code. `Ongoing` is the
/// only status that accepts registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(into = "i16", try_from = "i16")]
#[repr(i16)]
pub enum EventStatus {
    Upcoming = 1,
    Ongoing = 2,
    Ended = 3,
    Canceled = 4,
}

impl EventStatus {
    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn accepts_registrations(self) -> bool {
        matches!(self, EventStatus::Ongoing)
    }

    /// Guarded transition: upcoming -> ongoing -> ended, upcoming/ongoing -> canceled
    pub fn transition(self, to: EventStatus) -> Result<EventStatus, CampusWallError> {
        use EventStatus::*;
        match (self, to) {
            (Upcoming, Ongoing) | (Ongoing, Ended) | (Upcoming, Canceled) | (Ongoing, Canceled) => Ok(to),
            _ => Err(CampusWallError::InvalidStatus {
                from: self.to_string(),
                to: to.to_string(),
            }),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Ended => "ended",
            EventStatus::Canceled => "canceled",
        };
        f.write_str(label)
    }
}

impl From<EventStatus> for i16 {
    fn from(status: EventStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i16> for EventStatus {
    type Error = CampusWallError;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(EventStatus::Upcoming),
            2 => Ok(EventStatus::Ongoing),
            3 => Ok(EventStatus::Ended),
            4 => Ok(EventStatus::Canceled),
            other => Err(CampusWallError::InvalidInput(format!("Unknown event status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub max_participants: Option<i32>,
    pub current_participants: i32,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub status: EventStatus,
    pub is_recommended: bool,
    pub organizer_id: i64,
    pub allow_cancel_registration: bool,
    pub form_config: Option<serde_json::Value>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Remaining slots, `None` when the event is uncapped
    pub fn remaining_slots(&self) -> Option<i32> {
        self.max_participants
            .map(|max| (max - self.current_participants).max(0))
    }

    pub fn is_full(&self) -> bool {
        matches!(self.remaining_slots(), Some(0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    #[validate(range(min = 1, message = "max_participants must be at least 1"))]
    pub max_participants: Option<i32>,
    pub registration_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_recommended: bool,
    #[serde(default = "default_allow_cancel")]
    pub allow_cancel_registration: bool,
    pub form_config: Option<serde_json::Value>,
}

fn default_allow_cancel() -> bool {
    true
}

/// Event row ready to be persisted
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub max_participants: Option<i32>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub is_recommended: bool,
    pub organizer_id: i64,
    pub allow_cancel_registration: bool,
    pub form_config: Option<serde_json::Value>,
}

impl NewEvent {
    pub fn from_request(request: CreateEventRequest, organizer_id: i64) -> Self {
        Self {
            title: request.title,
            description: request.description,
            start_time: request.start_time,
            end_time: request.end_time,
            location: request.location,
            max_participants: request.max_participants,
            registration_deadline: request.registration_deadline,
            is_recommended: request.is_recommended,
            organizer_id,
            allow_cancel_registration: request.allow_cancel_registration,
            form_config: request.form_config,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    #[validate(range(min = 1, message = "max_participants must be at least 1"))]
    pub max_participants: Option<i32>,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub is_recommended: Option<bool>,
    pub allow_cancel_registration: Option<bool>,
    pub form_config: Option<serde_json::Value>,
}

impl UpdateEventRequest {
    /// Apply the present fields onto a copy of `event`
    pub fn apply_to(&self, event: &Event) -> Event {
        let mut merged = event.clone();
        if let Some(title) = &self.title {
            merged.title = title.clone();
        }
        if let Some(description) = &self.description {
            merged.description = Some(description.clone());
        }
        if let Some(start_time) = self.start_time {
            merged.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            merged.end_time = end_time;
        }
        if let Some(location) = &self.location {
            merged.location = Some(location.clone());
        }
        if let Some(max) = self.max_participants {
            merged.max_participants = Some(max);
        }
        if let Some(deadline) = self.registration_deadline {
            merged.registration_deadline = Some(deadline);
        }
        if let Some(recommended) = self.is_recommended {
            merged.is_recommended = recommended;
        }
        if let Some(allow) = self.allow_cancel_registration {
            merged.allow_cancel_registration = allow;
        }
        if let Some(form_config) = &self.form_config {
            merged.form_config = Some(form_config.clone());
        }
        merged
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEventStatusRequest {
    pub status: EventStatus,
}

/// Query filter for event listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    pub status: Option<i16>,
    pub recommended: Option<bool>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}
