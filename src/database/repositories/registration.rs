//! Event registration repository implementation
//!
//! Every state-changing method runs in one transaction that locks the event
//! row first, so capacity checks and counter updates cannot interleave.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::database::store::{RegistrationQuery, RegistrationStore};
use crate::models::event::Event;
use crate::models::registration::{EventRegistration, RegistrationCounts, RegistrationStatus};
use crate::services::rules::{self, Admission};
use crate::utils::errors::{CampusWallError, Result};
use crate::utils::logging::log_database_operation;

#[derive(Clone, Debug)]
pub struct EventRegistrationRepository {
    pool: PgPool,
}

impl EventRegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_event(tx: &mut Transaction<'_, Postgres>, event_id: i64) -> Result<Event> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT id, title, description, start_time, end_time, location, max_participants, current_participants,
                   registration_deadline, status, is_recommended, organizer_id, allow_cancel_registration,
                   form_config, view_count, created_at, updated_at
            FROM events WHERE id = $1 FOR UPDATE
            "#
        )
        .bind(event_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(CampusWallError::EventNotFound { event_id })
    }

    async fn lock_user_registration(
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
        user_id: i64,
    ) -> Result<Option<EventRegistration>> {
        let registration = sqlx::query_as::<_, EventRegistration>(
            r#"
            SELECT id, event_id, user_id, status, form_data, registered_at, canceled_at, cancel_reason,
                   check_in_time, updated_at
            FROM event_registrations WHERE event_id = $1 AND user_id = $2 FOR UPDATE
            "#
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(registration)
    }

    async fn shift_participants(
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
        delta: i32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }

        sqlx::query(
            "UPDATE events SET current_participants = current_participants + $2, updated_at = $3 WHERE id = $1"
        )
        .bind(event_id)
        .bind(delta)
        .bind(now)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl RegistrationStore for EventRegistrationRepository {
    /// Find registration by ID
    async fn find_registration(&self, id: i64) -> Result<Option<EventRegistration>> {
        let registration = sqlx::query_as::<_, EventRegistration>(
            r#"
            SELECT id, event_id, user_id, status, form_data, registered_at, canceled_at, cancel_reason,
                   check_in_time, updated_at
            FROM event_registrations WHERE id = $1
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Find the registration row of a user for an event, in any status
    async fn find_user_registration(&self, event_id: i64, user_id: i64) -> Result<Option<EventRegistration>> {
        let registration = sqlx::query_as::<_, EventRegistration>(
            r#"
            SELECT id, event_id, user_id, status, form_data, registered_at, canceled_at, cancel_reason,
                   check_in_time, updated_at
            FROM event_registrations WHERE event_id = $1 AND user_id = $2
            "#
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// List registrations of an event with pagination
    async fn list_registrations(&self, query: RegistrationQuery) -> Result<Vec<EventRegistration>> {
        let registrations = sqlx::query_as::<_, EventRegistration>(
            r#"
            SELECT id, event_id, user_id, status, form_data, registered_at, canceled_at, cancel_reason,
                   check_in_time, updated_at
            FROM event_registrations
            WHERE event_id = $1 AND ($2::SMALLINT IS NULL OR status = $2)
            ORDER BY registered_at ASC, id ASC
            LIMIT $3 OFFSET $4
            "#
        )
        .bind(query.event_id)
        .bind(query.status)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(registrations)
    }

    /// Get registrations of a user, most recent first
    async fn list_user_registrations(&self, user_id: i64) -> Result<Vec<EventRegistration>> {
        let registrations = sqlx::query_as::<_, EventRegistration>(
            r#"
            SELECT id, event_id, user_id, status, form_data, registered_at, canceled_at, cancel_reason,
                   check_in_time, updated_at
            FROM event_registrations
            WHERE user_id = $1
            ORDER BY registered_at DESC, id DESC
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(registrations)
    }

    /// Count registration rows of an event per status
    async fn count_by_status(&self, event_id: i64) -> Result<RegistrationCounts> {
        let rows: Vec<(RegistrationStatus, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM event_registrations WHERE event_id = $1 GROUP BY status"
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = RegistrationCounts::default();
        for (status, count) in rows {
            match status {
                RegistrationStatus::Canceled => counts.canceled = count,
                RegistrationStatus::Registered => counts.registered = count,
                RegistrationStatus::Attended => counts.attended = count,
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
        let started = Instant::now();
        let mut tx = self.pool.begin().await?;

        let event = Self::lock_event(&mut tx, event_id).await?;
        let existing = Self::lock_user_registration(&mut tx, event_id, user_id).await?;

        let registration = match rules::plan_admission(&event, user_id, existing.as_ref(), now)? {
            Admission::Insert => {
                sqlx::query_as::<_, EventRegistration>(
                    r#"
                    INSERT INTO event_registrations (event_id, user_id, status, form_data, registered_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $5)
                    RETURNING id, event_id, user_id, status, form_data, registered_at, canceled_at, cancel_reason,
                              check_in_time, updated_at
                    "#
                )
                .bind(event_id)
                .bind(user_id)
                .bind(RegistrationStatus::Registered)
                .bind(form_data)
                .bind(now)
                .fetch_one(&mut *tx)
                .await?
            }
            Admission::Revive { registration_id } => {
                sqlx::query_as::<_, EventRegistration>(
                    r#"
                    UPDATE event_registrations
                    SET status = $2,
                        form_data = $3,
                        registered_at = $4,
                        canceled_at = NULL,
                        cancel_reason = NULL,
                        check_in_time = NULL,
                        updated_at = $4
                    WHERE id = $1
                    RETURNING id, event_id, user_id, status, form_data, registered_at, canceled_at, cancel_reason,
                              check_in_time, updated_at
                    "#
                )
                .bind(registration_id)
                .bind(RegistrationStatus::Registered)
                .bind(form_data)
                .bind(now)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        Self::shift_participants(&mut tx, event_id, 1, now).await?;
        tx.commit().await?;

        log_database_operation("admit", "event_registrations", started.elapsed().as_millis() as u64, true);
        Ok(registration)
    }

    async fn withdraw(
        &self,
        event_id: i64,
        user_id: i64,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<EventRegistration> {
        let mut tx = self.pool.begin().await?;

        let event = Self::lock_event(&mut tx, event_id).await?;
        let existing = Self::lock_user_registration(&mut tx, event_id, user_id).await?;
        let registration_id = rules::check_cancellation(&event, user_id, existing.as_ref())?;

        let registration = sqlx::query_as::<_, EventRegistration>(
            r#"
            UPDATE event_registrations
            SET status = $2, canceled_at = $3, cancel_reason = $4, updated_at = $3
            WHERE id = $1
            RETURNING id, event_id, user_id, status, form_data, registered_at, canceled_at, cancel_reason,
                      check_in_time, updated_at
            "#
        )
        .bind(registration_id)
        .bind(RegistrationStatus::Canceled)
        .bind(now)
        .bind(reason)
        .fetch_one(&mut *tx)
        .await?;

        Self::shift_participants(&mut tx, event_id, -1, now).await?;
        tx.commit().await?;

        Ok(registration)
    }

    async fn check_in(&self, registration_id: i64, now: DateTime<Utc>) -> Result<EventRegistration> {
        let mut tx = self.pool.begin().await?;

        let event_id: Option<(i64,)> =
            sqlx::query_as("SELECT event_id FROM event_registrations WHERE id = $1")
                .bind(registration_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (event_id,) = event_id.ok_or(CampusWallError::RegistrationNotFound { registration_id })?;

        // Event before registration, matching the lock order of admit/withdraw
        let event = Self::lock_event(&mut tx, event_id).await?;
        let registration = sqlx::query_as::<_, EventRegistration>(
            r#"
            SELECT id, event_id, user_id, status, form_data, registered_at, canceled_at, cancel_reason,
                   check_in_time, updated_at
            FROM event_registrations WHERE id = $1 FOR UPDATE
            "#
        )
        .bind(registration_id)
        .fetch_one(&mut *tx)
        .await?;

        rules::check_check_in(&event, &registration, now)?;

        let registration = sqlx::query_as::<_, EventRegistration>(
            r#"
            UPDATE event_registrations
            SET status = $2, check_in_time = $3, updated_at = $3
            WHERE id = $1
            RETURNING id, event_id, user_id, status, form_data, registered_at, canceled_at, cancel_reason,
                      check_in_time, updated_at
            "#
        )
        .bind(registration_id)
        .bind(RegistrationStatus::Attended)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(registration)
    }

    async fn override_status(
        &self,
        event_id: i64,
        ids: &[i64],
        status: RegistrationStatus,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        Self::lock_event(&mut tx, event_id).await?;
        let rows: Vec<(i64, RegistrationStatus)> = sqlx::query_as(
            "SELECT id, status FROM event_registrations WHERE event_id = $1 AND id = ANY($2) FOR UPDATE"
        )
        .bind(event_id)
        .bind(ids)
        .fetch_all(&mut *tx)
        .await?;

        if rows.is_empty() {
            return Ok(0);
        }

        let delta: i32 = rows
            .iter()
            .map(|(_, from)| rules::participant_delta(*from, status))
            .sum();

        let result = sqlx::query(
            r#"
            UPDATE event_registrations
            SET status = $3,
                canceled_at = CASE WHEN $3 = 0 THEN COALESCE(canceled_at, $4) ELSE NULL END,
                check_in_time = CASE WHEN $3 = 2 THEN COALESCE(check_in_time, $4) ELSE check_in_time END,
                updated_at = $4
            WHERE event_id = $1 AND id = ANY($2)
            "#
        )
        .bind(event_id)
        .bind(ids)
        .bind(status.code())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        Self::shift_participants(&mut tx, event_id, delta, now).await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }
}
