//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod event;
pub mod form;
pub mod page;
pub mod registration;

// Re-export commonly used models
pub use event::{Event, EventStatus, NewEvent, CreateEventRequest, UpdateEventRequest, ChangeEventStatusRequest, EventFilter};
pub use form::{FormConfig, FormField, FormFieldKind};
pub use page::Page;
pub use registration::{
    EventRegistration, RegistrationStatus, RegisterRequest, CancelRegistrationRequest,
    UpdateRegistrationStatusRequest, BatchUpdateStatusRequest, RegistrationFilter,
    RegistrationStatusView, RegistrationCounts, RegistrationStats,
};
