//! Event repository implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::database::store::{EventQuery, EventStore};
use crate::models::event::{Event, EventStatus, NewEvent, UpdateEventRequest};
use crate::services::rules;
use crate::utils::errors::{CampusWallError, Result};

#[derive(Clone, Debug)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for EventRepository {
    /// Create a new event
    async fn create_event(&self, new_event: NewEvent) -> Result<Event> {
        let now = Utc::now();
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (title, description, start_time, end_time, location, max_participants,
                                registration_deadline, status, is_recommended, organizer_id,
                                allow_cancel_registration, form_config, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
            RETURNING id, title, description, start_time, end_time, location, max_participants, current_participants,
                      registration_deadline, status, is_recommended, organizer_id, allow_cancel_registration,
                      form_config, view_count, created_at, updated_at
            "#
        )
        .bind(new_event.title)
        .bind(new_event.description)
        .bind(new_event.start_time)
        .bind(new_event.end_time)
        .bind(new_event.location)
        .bind(new_event.max_participants)
        .bind(new_event.registration_deadline)
        .bind(EventStatus::Upcoming)
        .bind(new_event.is_recommended)
        .bind(new_event.organizer_id)
        .bind(new_event.allow_cancel_registration)
        .bind(new_event.form_config)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find event by ID
    async fn find_event(&self, id: i64) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, title, description, start_time, end_time, location, max_participants, current_participants,
                   registration_deadline, status, is_recommended, organizer_id, allow_cancel_registration,
                   form_config, view_count, created_at, updated_at
            FROM events WHERE id = $1
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Update event fields under a row lock
    async fn update_event(&self, id: i64, request: &UpdateEventRequest) -> Result<Event> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, title, description, start_time, end_time, location, max_participants, current_participants,
                   registration_deadline, status, is_recommended, organizer_id, allow_cancel_registration,
                   form_config, view_count, created_at, updated_at
            FROM events WHERE id = $1 FOR UPDATE
            "#
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CampusWallError::EventNotFound { event_id: id })?;

        let merged = request.apply_to(&current);
        rules::validate_schedule(
            merged.start_time,
            merged.end_time,
            merged.registration_deadline,
            merged.max_participants,
            merged.current_participants,
        )?;

        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET title = $2,
                description = $3,
                start_time = $4,
                end_time = $5,
                location = $6,
                max_participants = $7,
                registration_deadline = $8,
                is_recommended = $9,
                allow_cancel_registration = $10,
                form_config = $11,
                updated_at = $12
            WHERE id = $1
            RETURNING id, title, description, start_time, end_time, location, max_participants, current_participants,
                      registration_deadline, status, is_recommended, organizer_id, allow_cancel_registration,
                      form_config, view_count, created_at, updated_at
            "#
        )
        .bind(id)
        .bind(merged.title)
        .bind(merged.description)
        .bind(merged.start_time)
        .bind(merged.end_time)
        .bind(merged.location)
        .bind(merged.max_participants)
        .bind(merged.registration_deadline)
        .bind(merged.is_recommended)
        .bind(merged.allow_cancel_registration)
        .bind(merged.form_config)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(event)
    }

    /// Change event status along the guarded lifecycle
    async fn change_event_status(&self, id: i64, status: EventStatus) -> Result<Event> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(EventStatus,)> =
            sqlx::query_as("SELECT status FROM events WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let (from,) = current.ok_or(CampusWallError::EventNotFound { event_id: id })?;
        let to = from.transition(status)?;

        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING id, title, description, start_time, end_time, location, max_participants, current_participants,
                      registration_deadline, status, is_recommended, organizer_id, allow_cancel_registration,
                      form_config, view_count, created_at, updated_at
            "#
        )
        .bind(id)
        .bind(to)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(event)
    }

    /// List events with optional filters, soonest first
    async fn list_events(&self, query: EventQuery) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, title, description, start_time, end_time, location, max_participants, current_participants,
                   registration_deadline, status, is_recommended, organizer_id, allow_cancel_registration,
                   form_config, view_count, created_at, updated_at
            FROM events
            WHERE ($1::SMALLINT IS NULL OR status = $1)
              AND ($2::BOOLEAN IS NULL OR is_recommended = $2)
            ORDER BY start_time ASC, id ASC
            LIMIT $3 OFFSET $4
            "#
        )
        .bind(query.status)
        .bind(query.recommended)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Count events matching the listing filters
    async fn count_events(&self, query: EventQuery) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM events
            WHERE ($1::SMALLINT IS NULL OR status = $1)
              AND ($2::BOOLEAN IS NULL OR is_recommended = $2)
            "#
        )
        .bind(query.status)
        .bind(query.recommended)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Add buffered views to the stored counter
    async fn add_views(&self, id: i64, views: i64) -> Result<()> {
        sqlx::query("UPDATE events SET view_count = view_count + $2 WHERE id = $1")
            .bind(id)
            .bind(views)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
