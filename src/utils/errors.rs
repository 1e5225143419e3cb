//! Error handling for Campus Wall
//!
//! This module defines the main error type used throughout the service,
//! the shared numeric error code table exposed to API clients, and the
//! severity classification used when logging failures.

use serde::Serialize;
use thiserror::Error;

/// Main error type for the Campus Wall event service
#[derive(Error, Debug)]
pub enum CampusWallError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Export error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Event {event_id} is not open for registration")]
    EventNotOpen { event_id: i64 },

    #[error("Registration for event {event_id} is closed")]
    RegistrationClosed { event_id: i64 },

    #[error("User {user_id} is already registered for event {event_id}")]
    AlreadyRegistered { event_id: i64, user_id: i64 },

    #[error("Event {event_id} is full")]
    EventFull { event_id: i64 },

    #[error("Event {event_id} does not allow canceling registrations")]
    CancelNotAllowed { event_id: i64 },

    #[error("User {user_id} is not registered for event {event_id}")]
    NotRegistered { event_id: i64, user_id: i64 },

    #[error("Registration not found: {registration_id}")]
    RegistrationNotFound { registration_id: i64 },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatus { from: String, to: String },

    #[error("Event {event_id} has not started yet")]
    EventNotStarted { event_id: i64 },

    #[error("Event {event_id} has already ended")]
    EventEnded { event_id: i64 },

    #[error("Invalid registration form field '{field}': {reason}")]
    FormInvalid { field: String, reason: String },
}

/// Result type alias for Campus Wall operations
pub type Result<T> = std::result::Result<T, CampusWallError>;

/// Numeric error code plus default client message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorCode {
    pub code: u32,
    pub message: &'static str,
}

impl ErrorCode {
    pub const SUCCESS: ErrorCode = ErrorCode { code: 0, message: "success" };
    pub const PARAM_ERROR: ErrorCode = ErrorCode { code: 400, message: "Invalid parameters" };
    pub const UNAUTHORIZED: ErrorCode = ErrorCode { code: 401, message: "Authentication required" };
    pub const FORBIDDEN: ErrorCode = ErrorCode { code: 403, message: "Permission denied" };
    pub const NOT_FOUND: ErrorCode = ErrorCode { code: 404, message: "Resource not found" };
    pub const SERVER_ERROR: ErrorCode = ErrorCode { code: 500, message: "Internal server error" };

    pub const EVENT_NOT_FOUND: ErrorCode = ErrorCode { code: 801, message: "Event not found" };
    pub const EVENT_FULL: ErrorCode = ErrorCode { code: 802, message: "Event is full" };
    pub const EVENT_NOT_OPEN: ErrorCode = ErrorCode { code: 803, message: "Event is not open for registration" };
    pub const REGISTRATION_CLOSED: ErrorCode = ErrorCode { code: 804, message: "Registration deadline has passed" };
    pub const EVENT_NOT_STARTED: ErrorCode = ErrorCode { code: 805, message: "Event has not started" };
    pub const EVENT_ENDED: ErrorCode = ErrorCode { code: 806, message: "Event has ended" };
    pub const ALREADY_REGISTERED: ErrorCode = ErrorCode { code: 807, message: "Already registered for this event" };
    pub const NOT_REGISTERED: ErrorCode = ErrorCode { code: 808, message: "Not registered for this event" };
    pub const CANCEL_NOT_ALLOWED: ErrorCode = ErrorCode { code: 809, message: "Canceling registration is not allowed" };
    pub const REGISTRATION_NOT_FOUND: ErrorCode = ErrorCode { code: 810, message: "Registration not found" };
    pub const INVALID_STATUS: ErrorCode = ErrorCode { code: 811, message: "Invalid status" };
    pub const FORM_INVALID: ErrorCode = ErrorCode { code: 812, message: "Registration form is invalid" };
}

impl CampusWallError {
    /// Map the error onto the shared client-facing code table
    pub fn error_code(&self) -> ErrorCode {
        match self {
            CampusWallError::Authentication(_) | CampusWallError::Jwt(_) => ErrorCode::UNAUTHORIZED,
            CampusWallError::PermissionDenied(_) => ErrorCode::FORBIDDEN,
            CampusWallError::InvalidInput(_) | CampusWallError::Validation(_) => ErrorCode::PARAM_ERROR,
            CampusWallError::NotFound(_) => ErrorCode::NOT_FOUND,
            CampusWallError::EventNotFound { .. } => ErrorCode::EVENT_NOT_FOUND,
            CampusWallError::EventNotOpen { .. } => ErrorCode::EVENT_NOT_OPEN,
            CampusWallError::RegistrationClosed { .. } => ErrorCode::REGISTRATION_CLOSED,
            CampusWallError::AlreadyRegistered { .. } => ErrorCode::ALREADY_REGISTERED,
            CampusWallError::EventFull { .. } => ErrorCode::EVENT_FULL,
            CampusWallError::CancelNotAllowed { .. } => ErrorCode::CANCEL_NOT_ALLOWED,
            CampusWallError::NotRegistered { .. } => ErrorCode::NOT_REGISTERED,
            CampusWallError::RegistrationNotFound { .. } => ErrorCode::REGISTRATION_NOT_FOUND,
            CampusWallError::InvalidStatus { .. } => ErrorCode::INVALID_STATUS,
            CampusWallError::EventNotStarted { .. } => ErrorCode::EVENT_NOT_STARTED,
            CampusWallError::EventEnded { .. } => ErrorCode::EVENT_ENDED,
            CampusWallError::FormInvalid { .. } => ErrorCode::FORM_INVALID,
            CampusWallError::Database(_)
            | CampusWallError::Migration(_)
            | CampusWallError::Redis(_)
            | CampusWallError::Serialization(_)
            | CampusWallError::Io(_)
            | CampusWallError::UrlParse(_)
            | CampusWallError::Export(_)
            | CampusWallError::Config(_) => ErrorCode::SERVER_ERROR,
        }
    }

    /// Field-level details for validation failures
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            CampusWallError::Validation(errors) => {
                let fields: serde_json::Map<String, serde_json::Value> = errors
                    .field_errors()
                    .iter()
                    .map(|(field, errs)| {
                        let messages: Vec<String> = errs
                            .iter()
                            .map(|e| {
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            })
                            .collect();
                        (field.to_string(), serde_json::json!(messages))
                    })
                    .collect();
                Some(serde_json::Value::Object(fields))
            }
            CampusWallError::FormInvalid { field, reason } => {
                let mut fields = serde_json::Map::new();
                fields.insert(field.clone(), serde_json::json!([reason]));
                Some(serde_json::Value::Object(fields))
            }
            _ => None,
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            CampusWallError::Database(_) => false,
            CampusWallError::Migration(_) => false,
            CampusWallError::Redis(_) => true,
            CampusWallError::Serialization(_) => false,
            CampusWallError::Io(_) => true,
            CampusWallError::UrlParse(_) => false,
            CampusWallError::Config(_) => false,
            _ => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CampusWallError::Database(_) => ErrorSeverity::Critical,
            CampusWallError::Migration(_) => ErrorSeverity::Critical,
            CampusWallError::Config(_) => ErrorSeverity::Critical,
            CampusWallError::Redis(_)
            | CampusWallError::Serialization(_)
            | CampusWallError::Io(_)
            | CampusWallError::UrlParse(_)
            | CampusWallError::Export(_) => ErrorSeverity::Error,
            CampusWallError::Authentication(_)
            | CampusWallError::Jwt(_)
            | CampusWallError::PermissionDenied(_) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Info,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
