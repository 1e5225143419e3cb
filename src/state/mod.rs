//! Shared application state
//!
//! Cloned into every request handler by axum; everything inside is behind
//! `Arc` or cheap to clone.

use std::sync::Arc;

use crate::config::Settings;
use crate::database::DatabaseService;
use crate::services::ServiceFactory;
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub services: Arc<ServiceFactory>,
}

impl AppState {
    pub fn new(settings: Settings, database: DatabaseService) -> Result<Self> {
        let services = ServiceFactory::new(&settings, database)?;
        Ok(Self {
            settings: Arc::new(settings),
            services: Arc::new(services),
        })
    }

    /// Internal error details are only exposed outside production
    pub fn expose_error_details(&self) -> bool {
        !self.settings.is_production()
    }
}
