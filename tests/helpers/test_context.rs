//! Test context for service and router tests
//!
//! Builds the full application over the in-memory store so tests exercise
//! the same services, extractors and envelopes as production.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use campus_wall::{
    config::Settings,
    database::{DatabaseService, EventStore},
    models::{CreateEventRequest, Event, EventStatus},
    router,
    services::{AuthContext, EventRegistrationService, EventService, Role},
    state::AppState,
};

use super::test_data::{ADMIN_ID, ORGANIZER_ID};

/// Settings for tests: memory store, no Redis, one configured admin
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.database.url = "memory://".to_string();
    settings.redis.enabled = false;
    settings.auth.admin_ids = vec![ADMIN_ID];
    settings
}

pub struct TestContext {
    pub state: AppState,
    pub app: Router,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_settings(test_settings())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let state = AppState::new(settings, DatabaseService::memory()).expect("Failed to build app state");
        let app = router(state.clone());
        Self { state, app }
    }

    pub fn events(&self) -> &EventService {
        &self.state.services.event_service
    }

    pub fn registrations(&self) -> &EventRegistrationService {
        &self.state.services.registration_service
    }

    pub fn organizer() -> AuthContext {
        AuthContext { user_id: ORGANIZER_ID, role: Role::Organizer }
    }

    pub fn admin() -> AuthContext {
        AuthContext { user_id: ADMIN_ID, role: Role::Admin }
    }

    pub fn user(user_id: i64) -> AuthContext {
        AuthContext { user_id, role: Role::User }
    }

    /// Create an event as the default organizer and open it for registration
    pub async fn open_event(&self, request: CreateEventRequest) -> Event {
        let organizer = Self::organizer();
        let event = self
            .events()
            .create_event(&organizer, request)
            .await
            .expect("Failed to create event");
        self.events()
            .change_status(&organizer, event.id, EventStatus::Ongoing)
            .await
            .expect("Failed to open event")
    }

    /// Current stored state of an event, read without counting a view
    pub async fn reload(&self, event_id: i64) -> Event {
        self.state
            .services
            .database()
            .events
            .find_event(event_id)
            .await
            .expect("Failed to read event")
            .expect("Event missing")
    }

    pub fn token(&self, user_id: i64, role: Role) -> String {
        self.state
            .services
            .auth_service
            .issue_token(user_id, role)
            .expect("Failed to issue token")
    }

    pub async fn send_raw(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        self.app.clone().oneshot(request).await.expect("Router failed")
    }

    /// Send a request and decode the JSON response body
    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.send_raw(method, uri, token, body).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response is not JSON")
        };
        (status, json)
    }
}
