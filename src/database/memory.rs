//! In-process store selected with a `memory://` database URL
//!
//! One async mutex guards all tables, which gives every trait method the
//! same all-or-nothing behavior as the transactional PostgreSQL repositories.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::database::store::{EventQuery, EventStore, RegistrationQuery, RegistrationStore};
use crate::models::{
    Event, EventRegistration, EventStatus, NewEvent, RegistrationCounts, RegistrationStatus,
    UpdateEventRequest,
};
use crate::services::rules::{self, Admission};
use crate::utils::errors::{CampusWallError, Result};

#[derive(Debug, Default)]
struct Tables {
    events: BTreeMap<i64, Event>,
    registrations: BTreeMap<i64, EventRegistration>,
    next_event_id: i64,
    next_registration_id: i64,
}

impl Tables {
    fn event_mut(&mut self, event_id: i64) -> Result<&mut Event> {
        self.events
            .get_mut(&event_id)
            .ok_or(CampusWallError::EventNotFound { event_id })
    }

    fn user_registration(&self, event_id: i64, user_id: i64) -> Option<&EventRegistration> {
        self.registrations
            .values()
            .find(|r| r.event_id == event_id && r.user_id == user_id)
    }

    fn shift_participants(&mut self, event_id: i64, delta: i32, now: DateTime<Utc>) -> Result<()> {
        if delta != 0 {
            let event = self.event_mut(event_id)?;
            event.current_participants += delta;
            event.updated_at = now;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_event_query(event: &Event, query: &EventQuery) -> bool {
    query.status.map_or(true, |s| event.status == s)
        && query.recommended.map_or(true, |r| event.is_recommended == r)
}

fn window<T>(items: impl Iterator<Item = T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn create_event(&self, new_event: NewEvent) -> Result<Event> {
        let mut tables = self.tables.lock().await;
        tables.next_event_id += 1;
        let now = Utc::now();
        let event = Event {
            id: tables.next_event_id,
            title: new_event.title,
            description: new_event.description,
            start_time: new_event.start_time,
            end_time: new_event.end_time,
            location: new_event.location,
            max_participants: new_event.max_participants,
            current_participants: 0,
            registration_deadline: new_event.registration_deadline,
            status: EventStatus::Upcoming,
            is_recommended: new_event.is_recommended,
            organizer_id: new_event.organizer_id,
            allow_cancel_registration: new_event.allow_cancel_registration,
            form_config: new_event.form_config,
            view_count: 0,
            created_at: now,
            updated_at: now,
        };
        tables.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn find_event(&self, id: i64) -> Result<Option<Event>> {
        Ok(self.tables.lock().await.events.get(&id).cloned())
    }

    async fn update_event(&self, id: i64, request: &UpdateEventRequest) -> Result<Event> {
        let mut tables = self.tables.lock().await;
        let event = tables.event_mut(id)?;
        let mut merged = request.apply_to(event);
        rules::validate_schedule(
            merged.start_time,
            merged.end_time,
            merged.registration_deadline,
            merged.max_participants,
            merged.current_participants,
        )?;
        merged.updated_at = Utc::now();
        *event = merged.clone();
        Ok(merged)
    }

    async fn change_event_status(&self, id: i64, status: EventStatus) -> Result<Event> {
        let mut tables = self.tables.lock().await;
        let event = tables.event_mut(id)?;
        event.status = event.status.transition(status)?;
        event.updated_at = Utc::now();
        Ok(event.clone())
    }

    async fn list_events(&self, query: EventQuery) -> Result<Vec<Event>> {
        let tables = self.tables.lock().await;
        let mut events: Vec<&Event> = tables
            .events
            .values()
            .filter(|e| matches_event_query(e, &query))
            .collect();
        events.sort_by_key(|e| (e.start_time, e.id));
        Ok(window(events.into_iter().cloned(), query.limit, query.offset))
    }

    async fn count_events(&self, query: EventQuery) -> Result<i64> {
        let tables = self.tables.lock().await;
        Ok(tables.events.values().filter(|e| matches_event_query(e, &query)).count() as i64)
    }

    async fn add_views(&self, id: i64, views: i64) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if let Some(event) = tables.events.get_mut(&id) {
            event.view_count += views;
        }
        Ok(())
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn find_registration(&self, id: i64) -> Result<Option<EventRegistration>> {
        Ok(self.tables.lock().await.registrations.get(&id).cloned())
    }

    async fn find_user_registration(&self, event_id: i64, user_id: i64) -> Result<Option<EventRegistration>> {
        Ok(self.tables.lock().await.user_registration(event_id, user_id).cloned())
    }

    async fn list_registrations(&self, query: RegistrationQuery) -> Result<Vec<EventRegistration>> {
        let tables = self.tables.lock().await;
        let mut registrations: Vec<&EventRegistration> = tables
            .registrations
            .values()
            .filter(|r| r.event_id == query.event_id)
            .filter(|r| query.status.map_or(true, |s| r.status == s))
            .collect();
        registrations.sort_by_key(|r| (r.registered_at, r.id));
        Ok(window(registrations.into_iter().cloned(), query.limit, query.offset))
    }

    async fn list_user_registrations(&self, user_id: i64) -> Result<Vec<EventRegistration>> {
        let tables = self.tables.lock().await;
        let mut registrations: Vec<EventRegistration> = tables
            .registrations
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        registrations.sort_by(|a, b| (b.registered_at, b.id).cmp(&(a.registered_at, a.id)));
        Ok(registrations)
    }

    async fn count_by_status(&self, event_id: i64) -> Result<RegistrationCounts> {
        let tables = self.tables.lock().await;
        let mut counts = RegistrationCounts::default();
        for registration in tables.registrations.values().filter(|r| r.event_id == event_id) {
            match registration.status {
                RegistrationStatus::Canceled => counts.canceled += 1,
                RegistrationStatus::Registered => counts.registered += 1,
                RegistrationStatus::Attended => counts.attended += 1,
            }
        }
        Ok(counts)
    }

    async fn admit(
        &self,
        event_id: i64,
        user_id: i64,
        form_data: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<EventRegistration> {
        let mut tables = self.tables.lock().await;
        let event = tables.event_mut(event_id)?.clone();
        let existing = tables.user_registration(event_id, user_id).cloned();

        let registration = match rules::plan_admission(&event, user_id, existing.as_ref(), now)? {
            Admission::Insert => {
                tables.next_registration_id += 1;
                let registration = EventRegistration {
                    id: tables.next_registration_id,
                    event_id,
                    user_id,
                    status: RegistrationStatus::Registered,
                    form_data,
                    registered_at: now,
                    canceled_at: None,
                    cancel_reason: None,
                    check_in_time: None,
                    updated_at: now,
                };
                tables.registrations.insert(registration.id, registration.clone());
                registration
            }
            Admission::Revive { registration_id } => {
                let registration = tables
                    .registrations
                    .get_mut(&registration_id)
                    .ok_or(CampusWallError::RegistrationNotFound { registration_id })?;
                registration.status = RegistrationStatus::Registered;
                registration.form_data = form_data;
                registration.registered_at = now;
                registration.canceled_at = None;
                registration.cancel_reason = None;
                registration.check_in_time = None;
                registration.updated_at = now;
                registration.clone()
            }
        };

        tables.shift_participants(event_id, 1, now)?;
        Ok(registration)
    }

    async fn withdraw(
        &self,
        event_id: i64,
        user_id: i64,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<EventRegistration> {
        let mut tables = self.tables.lock().await;
        let event = tables.event_mut(event_id)?.clone();
        let existing = tables.user_registration(event_id, user_id).cloned();
        let registration_id = rules::check_cancellation(&event, user_id, existing.as_ref())?;

        let registration = tables
            .registrations
            .get_mut(&registration_id)
            .ok_or(CampusWallError::RegistrationNotFound { registration_id })?;
        registration.status = RegistrationStatus::Canceled;
        registration.canceled_at = Some(now);
        registration.cancel_reason = reason;
        registration.updated_at = now;
        let registration = registration.clone();

        tables.shift_participants(event_id, -1, now)?;
        Ok(registration)
    }

    async fn check_in(&self, registration_id: i64, now: DateTime<Utc>) -> Result<EventRegistration> {
        let mut tables = self.tables.lock().await;
        let current = tables
            .registrations
            .get(&registration_id)
            .cloned()
            .ok_or(CampusWallError::RegistrationNotFound { registration_id })?;
        let event = tables.event_mut(current.event_id)?.clone();

        rules::check_check_in(&event, &current, now)?;

        let registration = tables
            .registrations
            .get_mut(&registration_id)
            .ok_or(CampusWallError::RegistrationNotFound { registration_id })?;
        registration.status = RegistrationStatus::Attended;
        registration.check_in_time = Some(now);
        registration.updated_at = now;
        Ok(registration.clone())
    }

    async fn override_status(
        &self,
        event_id: i64,
        ids: &[i64],
        status: RegistrationStatus,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        tables.event_mut(event_id)?;

        let mut delta = 0;
        let mut updated = 0;
        for registration in tables
            .registrations
            .values_mut()
            .filter(|r| r.event_id == event_id && ids.contains(&r.id))
        {
            delta += rules::participant_delta(registration.status, status);
            registration.canceled_at = match status {
                RegistrationStatus::Canceled => registration.canceled_at.or(Some(now)),
                _ => None,
            };
            if status == RegistrationStatus::Attended && registration.check_in_time.is_none() {
                registration.check_in_time = Some(now);
            }
            registration.status = status;
            registration.updated_at = now;
            updated += 1;
        }

        tables.shift_participants(event_id, delta, now)?;
        Ok(updated)
    }
}
