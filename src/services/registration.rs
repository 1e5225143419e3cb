//! Event registration service
//!
//! Organizer and admin operations on an event's registrations: check-in,
//! status overrides, listings, statistics and export.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use validator::Validate;

use crate::database::{EventStore, RegistrationQuery, RegistrationStore};
use crate::models::{
    BatchUpdateStatusRequest, Event, EventRegistration, Page, RegistrationFilter,
    RegistrationStats, RegistrationStatus,
};
use crate::services::auth::AuthContext;
use crate::services::export::{self, ExportFile};
use crate::utils::errors::{CampusWallError, Result};
use crate::utils::helpers::{page_window, MAX_PAGE_SIZE};
use crate::utils::logging::{log_admin_action, log_registration_action};

#[derive(Clone)]
pub struct EventRegistrationService {
    events: Arc<dyn EventStore>,
    registrations: Arc<dyn RegistrationStore>,
    export_enabled: bool,
}

impl EventRegistrationService {
    pub fn new(
        events: Arc<dyn EventStore>,
        registrations: Arc<dyn RegistrationStore>,
        export_enabled: bool,
    ) -> Self {
        Self { events, registrations, export_enabled }
    }

    /// Load the event and make sure the caller manages it
    async fn managed_event(&self, ctx: &AuthContext, event_id: i64) -> Result<Event> {
        let event = self
            .events
            .find_event(event_id)
            .await?
            .ok_or(CampusWallError::EventNotFound { event_id })?;
        ctx.require_event_manager(&event)?;
        Ok(event)
    }

    /// Mark a registered participant as attended
    pub async fn check_in(&self, ctx: &AuthContext, registration_id: i64) -> Result<EventRegistration> {
        let registration = self
            .registrations
            .find_registration(registration_id)
            .await?
            .ok_or(CampusWallError::RegistrationNotFound { registration_id })?;
        self.managed_event(ctx, registration.event_id).await?;

        let registration = self.registrations.check_in(registration_id, Utc::now()).await?;

        log_registration_action(registration.event_id, registration.id, ctx.user_id, "checked_in");
        Ok(registration)
    }

    /// Overwrite the status of many registrations of one event
    pub async fn batch_update_status(
        &self,
        ctx: &AuthContext,
        event_id: i64,
        request: BatchUpdateStatusRequest,
    ) -> Result<u64> {
        request.validate()?;
        self.managed_event(ctx, event_id).await?;

        let mut ids = request.ids;
        ids.sort_unstable();
        ids.dedup();

        let updated = self
            .registrations
            .override_status(event_id, &ids, request.status, Utc::now())
            .await?;

        log_admin_action(
            ctx.user_id,
            "batch_update_registration_status",
            Some(&format!("event:{}", event_id)),
            Some(&format!("status={} requested={} updated={}", request.status, ids.len(), updated)),
        );
        Ok(updated)
    }

    /// Overwrite the status of a single registration
    pub async fn update_status(
        &self,
        ctx: &AuthContext,
        event_id: i64,
        registration_id: i64,
        status: RegistrationStatus,
    ) -> Result<EventRegistration> {
        self.managed_event(ctx, event_id).await?;

        let updated = self
            .registrations
            .override_status(event_id, &[registration_id], status, Utc::now())
            .await?;
        if updated == 0 {
            return Err(CampusWallError::RegistrationNotFound { registration_id });
        }

        log_admin_action(
            ctx.user_id,
            "update_registration_status",
            Some(&format!("registration:{}", registration_id)),
            Some(&format!("status={}", status)),
        );

        self.registrations
            .find_registration(registration_id)
            .await?
            .ok_or(CampusWallError::RegistrationNotFound { registration_id })
    }

    pub async fn list_registrations(
        &self,
        ctx: &AuthContext,
        event_id: i64,
        filter: &RegistrationFilter,
    ) -> Result<Page<EventRegistration>> {
        self.managed_event(ctx, event_id).await?;

        let status = filter.status.map(RegistrationStatus::try_from).transpose()?;
        let (limit, offset) = page_window(filter.page, filter.page_size);
        let items = self
            .registrations
            .list_registrations(RegistrationQuery { event_id, status, limit, offset })
            .await?;

        let counts = self.registrations.count_by_status(event_id).await?;
        let total = match status {
            Some(RegistrationStatus::Canceled) => counts.canceled,
            Some(RegistrationStatus::Registered) => counts.registered,
            Some(RegistrationStatus::Attended) => counts.attended,
            None => counts.total(),
        };

        Ok(Page::new(items, total, limit, offset))
    }

    pub async fn statistics(&self, ctx: &AuthContext, event_id: i64) -> Result<RegistrationStats> {
        let event = self.managed_event(ctx, event_id).await?;
        let counts = self.registrations.count_by_status(event_id).await?;

        let active = counts.active();
        let attendance_rate = if active == 0 {
            0.0
        } else {
            counts.attended as f64 / active as f64
        };

        Ok(RegistrationStats {
            event_id,
            total: counts.total(),
            registered: counts.registered,
            attended: counts.attended,
            canceled: counts.canceled,
            max_participants: event.max_participants,
            current_participants: event.current_participants,
            remaining_slots: event.remaining_slots(),
            attendance_rate,
        })
    }

    /// Render every registration of the event as an Excel workbook
    pub async fn export(&self, ctx: &AuthContext, event_id: i64) -> Result<ExportFile> {
        if !self.export_enabled {
            return Err(CampusWallError::PermissionDenied(
                "Registration export is disabled".to_string()
            ));
        }
        let event = self.managed_event(ctx, event_id).await?;

        let mut registrations = Vec::new();
        loop {
            let batch = self
                .registrations
                .list_registrations(RegistrationQuery {
                    event_id,
                    status: None,
                    limit: MAX_PAGE_SIZE,
                    offset: registrations.len() as i64,
                })
                .await?;
            let done = (batch.len() as i64) < MAX_PAGE_SIZE;
            registrations.extend(batch);
            if done {
                break;
            }
        }

        info!(event_id = event_id, rows = registrations.len(), "Exporting registrations");
        log_admin_action(ctx.user_id, "export_registrations", Some(&format!("event:{}", event_id)), None);
        export::registrations_workbook(&event, &registrations)
    }
}
