//! Test data builders

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use campus_wall::models::CreateEventRequest;

pub const ORGANIZER_ID: i64 = 1000;
pub const ADMIN_ID: i64 = 1;
pub const OTHER_ORGANIZER_ID: i64 = 2000;

/// Event running from an hour ago until an hour from now
pub fn running_event(max_participants: Option<i32>) -> CreateEventRequest {
    let now = Utc::now();
    event_request(now - Duration::hours(1), now + Duration::hours(1), None, max_participants)
}

/// Event starting tomorrow with registration open until just before
pub fn upcoming_event(max_participants: Option<i32>) -> CreateEventRequest {
    let start = Utc::now() + Duration::days(1);
    event_request(start, start + Duration::hours(2), Some(start - Duration::hours(1)), max_participants)
}

/// Event that finished an hour ago
pub fn finished_event() -> CreateEventRequest {
    let now = Utc::now();
    event_request(now - Duration::hours(3), now - Duration::hours(1), None, None)
}

pub fn event_request(
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    registration_deadline: Option<DateTime<Utc>>,
    max_participants: Option<i32>,
) -> CreateEventRequest {
    CreateEventRequest {
        title: "Campus Hackathon".to_string(),
        description: Some("Build something in 24 hours".to_string()),
        start_time,
        end_time,
        location: Some("Library Hall".to_string()),
        max_participants,
        registration_deadline,
        is_recommended: false,
        allow_cancel_registration: true,
        form_config: None,
    }
}

/// Form asking for a name, a student id pattern and a t-shirt size
pub fn signup_form() -> Value {
    json!({
        "fields": [
            {"name": "name", "label": "Name", "type": "text", "required": true},
            {"name": "student_id", "type": "text", "required": true, "pattern": "^[0-9]{8}$"},
            {"name": "size", "type": "select", "options": ["S", "M", "L"]}
        ]
    })
}
