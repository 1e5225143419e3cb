//! Registration business rules
//!
//! Pure checks shared by every store backend. Stores call these while holding
//! their lock (row lock or mutex) so that the decision and the write happen
//! atomically.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;

use crate::models::{Event, EventRegistration, FormConfig, FormFieldKind, RegistrationStatus};
use crate::utils::errors::{CampusWallError, Result};

/// How an admitted registration is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// No row exists for the (event, user) pair yet
    Insert,
    /// A soft-canceled row is flipped back to registered
    Revive { registration_id: i64 },
}

/// Decide whether `user_id` may register for `event` at `now`
///
/// Checks run in a fixed order: status, deadline, duplicate, capacity.
pub fn plan_admission(
    event: &Event,
    user_id: i64,
    existing: Option<&EventRegistration>,
    now: DateTime<Utc>,
) -> Result<Admission> {
    if !event.status.accepts_registrations() {
        return Err(CampusWallError::EventNotOpen { event_id: event.id });
    }

    if let Some(deadline) = event.registration_deadline {
        if now > deadline {
            return Err(CampusWallError::RegistrationClosed { event_id: event.id });
        }
    }

    if let Some(registration) = existing {
        if registration.status.is_active() {
            return Err(CampusWallError::AlreadyRegistered { event_id: event.id, user_id });
        }
    }

    if event.is_full() {
        return Err(CampusWallError::EventFull { event_id: event.id });
    }

    match existing {
        Some(registration) => {
            registration.status.transition(RegistrationStatus::Registered)?;
            Ok(Admission::Revive { registration_id: registration.id })
        }
        None => Ok(Admission::Insert),
    }
}

/// Check that `registration` may be canceled by its owner
pub fn check_cancellation(
    event: &Event,
    user_id: i64,
    existing: Option<&EventRegistration>,
) -> Result<i64> {
    if !event.allow_cancel_registration {
        return Err(CampusWallError::CancelNotAllowed { event_id: event.id });
    }

    let registration = existing
        .filter(|r| r.status.is_active())
        .ok_or(CampusWallError::NotRegistered { event_id: event.id, user_id })?;

    registration.status.transition(RegistrationStatus::Canceled)?;
    Ok(registration.id)
}

/// Check that `registration` may be checked in at `now`
pub fn check_check_in(event: &Event, registration: &EventRegistration, now: DateTime<Utc>) -> Result<()> {
    registration.status.transition(RegistrationStatus::Attended)?;

    if now < event.start_time {
        return Err(CampusWallError::EventNotStarted { event_id: event.id });
    }
    if now > event.end_time {
        return Err(CampusWallError::EventEnded { event_id: event.id });
    }

    Ok(())
}

/// Change of `current_participants` caused by moving a row between statuses
pub fn participant_delta(from: RegistrationStatus, to: RegistrationStatus) -> i32 {
    match (from.is_active(), to.is_active()) {
        (false, true) => 1,
        (true, false) => -1,
        _ => 0,
    }
}

/// Validate the timing and capacity fields of an event
pub fn validate_schedule(
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    registration_deadline: Option<DateTime<Utc>>,
    max_participants: Option<i32>,
    current_participants: i32,
) -> Result<()> {
    if end_time <= start_time {
        return Err(CampusWallError::InvalidInput(
            "end_time must be after start_time".to_string()
        ));
    }

    if let Some(deadline) = registration_deadline {
        if deadline >= start_time {
            return Err(CampusWallError::InvalidInput(
                "registration_deadline must be before start_time".to_string()
            ));
        }
    }

    if let Some(max) = max_participants {
        if max < 1 {
            return Err(CampusWallError::InvalidInput(
                "max_participants must be at least 1".to_string()
            ));
        }
        if max < current_participants {
            return Err(CampusWallError::InvalidInput(format!(
                "max_participants cannot drop below the {} current participants",
                current_participants
            )));
        }
    }

    Ok(())
}

/// Parse and sanity-check an event's form configuration
pub fn parse_form_config(raw: &Value) -> Result<FormConfig> {
    let config = FormConfig::from_value(raw)
        .map_err(|e| CampusWallError::InvalidInput(format!("Invalid form_config: {}", e)))?;

    for field in &config.fields {
        if field.name.trim().is_empty() {
            return Err(CampusWallError::InvalidInput(
                "form_config fields need a name".to_string()
            ));
        }
        if field.kind == FormFieldKind::Select && field.options.is_empty() {
            return Err(CampusWallError::InvalidInput(format!(
                "select field '{}' needs options",
                field.name
            )));
        }
        if let Some(pattern) = &field.pattern {
            Regex::new(pattern).map_err(|e| {
                CampusWallError::InvalidInput(format!("Invalid pattern for '{}': {}", field.name, e))
            })?;
        }
    }

    Ok(config)
}

/// Validate submitted form data against an event's form configuration
pub fn validate_form_data(form_config: Option<&Value>, form_data: Option<&Value>) -> Result<()> {
    let data = match form_data {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map),
        Some(_) => {
            return Err(CampusWallError::FormInvalid {
                field: "form_data".to_string(),
                reason: "must be an object".to_string(),
            })
        }
    };

    let config = match form_config {
        None | Some(Value::Null) => return Ok(()),
        Some(raw) => parse_form_config(raw)?,
    };

    for field in &config.fields {
        let value = data.and_then(|map| map.get(&field.name)).filter(|v| !is_blank(v));

        let value = match value {
            Some(value) => value,
            None if field.required => {
                return Err(invalid(&field.name, "is required"));
            }
            None => continue,
        };

        match field.kind {
            FormFieldKind::Text => {
                let text = value.as_str().ok_or_else(|| invalid(&field.name, "must be text"))?;
                if let Some(pattern) = &field.pattern {
                    let re = Regex::new(pattern).map_err(|e| {
                        CampusWallError::InvalidInput(format!("Invalid pattern for '{}': {}", field.name, e))
                    })?;
                    if !re.is_match(text) {
                        return Err(invalid(&field.name, "has an invalid format"));
                    }
                }
            }
            FormFieldKind::Number => {
                if !value.is_number() {
                    return Err(invalid(&field.name, "must be a number"));
                }
            }
            FormFieldKind::Boolean => {
                if !value.is_boolean() {
                    return Err(invalid(&field.name, "must be true or false"));
                }
            }
            FormFieldKind::Select => {
                let choice = value.as_str().ok_or_else(|| invalid(&field.name, "must be text"))?;
                if !field.options.iter().any(|o| o == choice) {
                    return Err(invalid(&field.name, "is not one of the allowed options"));
                }
            }
        }
    }

    Ok(())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn invalid(field: &str, reason: &str) -> CampusWallError {
    CampusWallError::FormInvalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
