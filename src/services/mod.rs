//! Services module
//!
//! This module contains business logic services

pub mod auth;
pub mod event;
pub mod export;
pub mod redis;
pub mod registration;
pub mod rules;
pub mod views;

// Re-export commonly used services
pub use auth::{AuthContext, AuthService, Claims, Role};
pub use event::EventService;
pub use export::ExportFile;
pub use redis::RedisService;
pub use registration::EventRegistrationService;
pub use views::ViewCounter;

use serde::Serialize;

use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub auth_service: AuthService,
    pub event_service: EventService,
    pub registration_service: EventRegistrationService,
    pub view_counter: ViewCounter,
    pub redis_service: Option<RedisService>,
    database: DatabaseService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    ///
    /// Redis is only used when enabled and view write-back is switched on.
    pub fn new(settings: &Settings, database: DatabaseService) -> Result<Self> {
        let redis_service = if settings.redis.enabled && settings.features.view_count_write_back {
            Some(RedisService::new(&settings.redis)?)
        } else {
            None
        };

        let view_counter = ViewCounter::new(database.events.clone(), redis_service.clone());
        let event_service = EventService::new(
            database.events.clone(),
            database.registrations.clone(),
            view_counter.clone(),
        );
        let registration_service = EventRegistrationService::new(
            database.events.clone(),
            database.registrations.clone(),
            settings.features.registration_export,
        );

        Ok(Self {
            auth_service: AuthService::new(&settings.auth),
            event_service,
            registration_service,
            view_counter,
            redis_service,
            database,
        })
    }

    /// Stores the services run on
    pub fn database(&self) -> &DatabaseService {
        &self.database
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let database_healthy = self.database.health_check().await.is_ok();
        let redis_healthy = match &self.redis_service {
            Some(redis) => Some(redis.health_check().await.unwrap_or(false)),
            None => None,
        };

        ServiceHealthStatus { database_healthy, redis_healthy }
    }
}

/// Health status for all services
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
    /// `None` when Redis is not in use
    pub redis_healthy: Option<bool>,
}

impl ServiceHealthStatus {
    /// Redis is optional; only the database decides overall health
    pub fn is_healthy(&self) -> bool {
        self.database_healthy
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.database_healthy {
            issues.push("Database connection failed".to_string());
        }
        if self.redis_healthy == Some(false) {
            issues.push("Redis connection failed".to_string());
        }

        issues
    }
}
