//! Database service layer
//!
//! Bundles the event and registration stores behind trait objects so the
//! service layer runs unchanged over PostgreSQL or the in-memory store.

use std::sync::Arc;

use crate::config::Settings;
use crate::database::connection::{self, DatabasePool};
use crate::database::memory::MemoryStore;
use crate::database::repositories::{EventRegistrationRepository, EventRepository};
use crate::database::store::{EventStore, RegistrationStore};
use crate::utils::errors::CampusWallError;

#[derive(Clone)]
pub struct DatabaseService {
    pub events: Arc<dyn EventStore>,
    pub registrations: Arc<dyn RegistrationStore>,
    pool: Option<DatabasePool>,
}

impl DatabaseService {
    /// Stores backed by a PostgreSQL pool
    pub fn postgres(pool: DatabasePool) -> Self {
        Self {
            events: Arc::new(EventRepository::new(pool.clone())),
            registrations: Arc::new(EventRegistrationRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Stores kept in process memory
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            events: store.clone(),
            registrations: store,
            pool: None,
        }
    }

    /// Connect the backend selected by `settings.database.url`
    pub async fn connect(settings: &Settings) -> Result<Self, CampusWallError> {
        if settings.uses_memory_store() {
            tracing::warn!("Using in-memory store; data is lost on shutdown");
            return Ok(Self::memory());
        }

        let pool = connection::create_pool(&settings.database).await?;
        connection::run_migrations(&pool).await?;
        Ok(Self::postgres(pool))
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), CampusWallError> {
        match &self.pool {
            Some(pool) => connection::health_check(pool).await,
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for DatabaseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseService")
            .field("backend", &if self.pool.is_some() { "postgres" } else { "memory" })
            .finish()
    }
}
