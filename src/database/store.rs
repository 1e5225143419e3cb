//! Storage traits implemented by the PostgreSQL repositories and the
//! in-memory store
//!
//! Operations that read a row, apply a rule from `services::rules` and write
//! the outcome are single trait methods so each backend can run them under
//! one lock or transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    Event, EventRegistration, EventStatus, NewEvent, RegistrationCounts, RegistrationStatus,
    UpdateEventRequest,
};
use crate::utils::errors::Result;

/// Listing criteria for events
#[derive(Debug, Clone, Copy, Default)]
pub struct EventQuery {
    pub status: Option<EventStatus>,
    pub recommended: Option<bool>,
    pub limit: i64,
    pub offset: i64,
}

/// Listing criteria for an event's registrations
#[derive(Debug, Clone, Copy)]
pub struct RegistrationQuery {
    pub event_id: i64,
    pub status: Option<RegistrationStatus>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn create_event(&self, new_event: NewEvent) -> Result<Event>;

    async fn find_event(&self, id: i64) -> Result<Option<Event>>;

    /// Merge `request` into the stored event and persist it after validation
    async fn update_event(&self, id: i64, request: &UpdateEventRequest) -> Result<Event>;

    /// Move the event along its guarded lifecycle
    async fn change_event_status(&self, id: i64, status: EventStatus) -> Result<Event>;

    async fn list_events(&self, query: EventQuery) -> Result<Vec<Event>>;

    async fn count_events(&self, query: EventQuery) -> Result<i64>;

    async fn add_views(&self, id: i64, views: i64) -> Result<()>;
}

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn find_registration(&self, id: i64) -> Result<Option<EventRegistration>>;

    async fn find_user_registration(&self, event_id: i64, user_id: i64) -> Result<Option<EventRegistration>>;

    async fn list_registrations(&self, query: RegistrationQuery) -> Result<Vec<EventRegistration>>;

    async fn list_user_registrations(&self, user_id: i64) -> Result<Vec<EventRegistration>>;

    async fn count_by_status(&self, event_id: i64) -> Result<RegistrationCounts>;

    /// Register `user_id` for `event_id`, inserting or reviving the row and
    /// incrementing the participant counter in the same unit
    async fn admit(
        &self,
        event_id: i64,
        user_id: i64,
        form_data: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<EventRegistration>;

    /// Soft-cancel the user's active registration and decrement the counter
    async fn withdraw(
        &self,
        event_id: i64,
        user_id: i64,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<EventRegistration>;

    async fn check_in(&self, registration_id: i64, now: DateTime<Utc>) -> Result<EventRegistration>;

    /// Administrative any-to-any status overwrite for rows of one event
    ///
    /// Returns the number of rows updated. The participant counter is moved
    /// by the net change in active rows.
    async fn override_status(
        &self,
        event_id: i64,
        ids: &[i64],
        status: RegistrationStatus,
        now: DateTime<Utc>,
    ) -> Result<u64>;
}
