//! Event service
//!
//! Event management and the participant side of the registration lifecycle:
//! registering, canceling and reading one's own registration state.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use validator::Validate;

use crate::database::{EventQuery, EventStore, RegistrationStore};
use crate::models::{
    CancelRegistrationRequest, CreateEventRequest, Event, EventFilter, EventRegistration,
    EventStatus, NewEvent, Page, RegistrationStatusView, UpdateEventRequest,
};
use crate::services::auth::AuthContext;
use crate::services::rules;
use crate::services::views::ViewCounter;
use crate::utils::errors::{CampusWallError, Result};
use crate::utils::helpers::{page_window, truncate_text};
use crate::utils::logging::{log_event_action, log_registration_action};

/// Stored cancel reasons are cut to this many characters
pub const MAX_CANCEL_REASON_CHARS: usize = 500;

#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn EventStore>,
    registrations: Arc<dyn RegistrationStore>,
    views: ViewCounter,
}

impl EventService {
    pub fn new(
        events: Arc<dyn EventStore>,
        registrations: Arc<dyn RegistrationStore>,
        views: ViewCounter,
    ) -> Self {
        Self { events, registrations, views }
    }

    async fn require_event(&self, event_id: i64) -> Result<Event> {
        self.events
            .find_event(event_id)
            .await?
            .ok_or(CampusWallError::EventNotFound { event_id })
    }

    /// Create an event owned by the caller
    pub async fn create_event(&self, ctx: &AuthContext, request: CreateEventRequest) -> Result<Event> {
        if !ctx.can_create_events() {
            return Err(CampusWallError::PermissionDenied(
                "Only organizers and admins can create events".to_string()
            ));
        }

        request.validate()?;
        rules::validate_schedule(
            request.start_time,
            request.end_time,
            request.registration_deadline,
            request.max_participants,
            0,
        )?;
        if let Some(form_config) = &request.form_config {
            rules::parse_form_config(form_config)?;
        }

        let event = self
            .events
            .create_event(NewEvent::from_request(request, ctx.user_id))
            .await?;

        log_event_action(event.id, "created", ctx.user_id, Some(&event.title));
        Ok(event)
    }

    /// Partially update an event's descriptive fields
    pub async fn update_event(
        &self,
        ctx: &AuthContext,
        event_id: i64,
        request: UpdateEventRequest,
    ) -> Result<Event> {
        let event = self.require_event(event_id).await?;
        ctx.require_event_manager(&event)?;

        request.validate()?;
        if let Some(form_config) = &request.form_config {
            rules::parse_form_config(form_config)?;
        }

        let event = self.events.update_event(event_id, &request).await?;
        log_event_action(event_id, "updated", ctx.user_id, None);
        Ok(event)
    }

    /// Move an event through its lifecycle
    pub async fn change_status(&self, ctx: &AuthContext, event_id: i64, status: EventStatus) -> Result<Event> {
        let event = self.require_event(event_id).await?;
        ctx.require_event_manager(&event)?;

        let event = self.events.change_event_status(event_id, status).await?;
        log_event_action(event_id, "status_changed", ctx.user_id, Some(&status.to_string()));
        Ok(event)
    }

    /// Event detail; counts a view
    pub async fn get_event(&self, event_id: i64) -> Result<Event> {
        let event = self.require_event(event_id).await?;
        self.views.record_view(event_id).await;
        Ok(event)
    }

    pub async fn list_events(&self, filter: &EventFilter) -> Result<Page<Event>> {
        let status = filter.status.map(EventStatus::try_from).transpose()?;
        let (limit, offset) = page_window(filter.page, filter.page_size);
        let query = EventQuery {
            status,
            recommended: filter.recommended,
            limit,
            offset,
        };

        let items = self.events.list_events(query).await?;
        let total = self.events.count_events(query).await?;
        debug!(count = items.len(), total = total, "Listed events");
        Ok(Page::new(items, total, limit, offset))
    }

    /// Register `user_id` for `event_id`
    ///
    /// The event's rules are checked up front so the caller gets the most
    /// specific error before the form is looked at; the store repeats the
    /// check under its lock before writing.
    pub async fn register_event(
        &self,
        event_id: i64,
        user_id: i64,
        form_data: Option<serde_json::Value>,
    ) -> Result<EventRegistration> {
        let event = self.require_event(event_id).await?;
        let existing = self.registrations.find_user_registration(event_id, user_id).await?;
        rules::plan_admission(&event, user_id, existing.as_ref(), Utc::now())?;

        rules::validate_form_data(event.form_config.as_ref(), form_data.as_ref())?;

        let form_data = form_data.filter(|v| !v.is_null());
        let registration = self
            .registrations
            .admit(event_id, user_id, form_data, Utc::now())
            .await?;

        log_registration_action(event_id, registration.id, user_id, "registered");
        Ok(registration)
    }

    /// Cancel the caller's active registration
    pub async fn cancel_registration(
        &self,
        event_id: i64,
        user_id: i64,
        request: CancelRegistrationRequest,
    ) -> Result<EventRegistration> {
        request.validate()?;
        self.require_event(event_id).await?;

        let reason = request
            .reason
            .map(|r| truncate_text(r.trim(), MAX_CANCEL_REASON_CHARS))
            .filter(|r| !r.is_empty());

        let registration = self
            .registrations
            .withdraw(event_id, user_id, reason, Utc::now())
            .await?;

        log_registration_action(event_id, registration.id, user_id, "canceled");
        info!(event_id = event_id, user_id = user_id, "Registration canceled");
        Ok(registration)
    }

    pub async fn registration_status(&self, event_id: i64, user_id: i64) -> Result<RegistrationStatusView> {
        self.require_event(event_id).await?;
        let registration = self.registrations.find_user_registration(event_id, user_id).await?;
        Ok(RegistrationStatusView::from_registration(registration.as_ref()))
    }

    pub async fn my_registrations(&self, user_id: i64) -> Result<Vec<EventRegistration>> {
        self.registrations.list_user_registrations(user_id).await
    }
}
