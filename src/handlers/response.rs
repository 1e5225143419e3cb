//! Response envelopes and error rendering
//!
//! Public endpoints answer `{code, msg, data}`, admin endpoints answer
//! `{success, message, data}`. Failed requests carry an [`ErrorReport`]
//! extension so the request middleware can log them and attach details.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::utils::errors::{CampusWallError, ErrorCode};

/// Envelope of the public API
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: u32,
    pub msg: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            code: ErrorCode::SUCCESS.code,
            msg: ErrorCode::SUCCESS.message.to_string(),
            data: Some(data),
        })
    }

    pub fn created(data: T) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Self::ok(data))
    }
}

/// Envelope of the admin API
#[derive(Debug, Serialize)]
pub struct AdminResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> AdminResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
        })
    }
}

/// Which envelope an error is rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    Public,
    Admin,
}

/// Error returned by handlers
#[derive(Debug)]
pub struct ApiError {
    error: CampusWallError,
    envelope: Envelope,
}

impl ApiError {
    /// Render `error` in the admin envelope
    pub fn admin(error: CampusWallError) -> Self {
        Self { error, envelope: Envelope::Admin }
    }

    pub fn error(&self) -> &CampusWallError {
        &self.error
    }
}

impl From<CampusWallError> for ApiError {
    fn from(error: CampusWallError) -> Self {
        Self { error, envelope: Envelope::Public }
    }
}

/// Failure attached to an error response for the request middleware
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub error: Arc<CampusWallError>,
    pub envelope: Envelope,
}

impl ErrorReport {
    /// Render the envelope; `expose_details` adds internal error text
    pub fn render(&self, expose_details: bool) -> Response {
        let code = self.error.error_code();
        let message = if code == ErrorCode::SERVER_ERROR {
            code.message.to_string()
        } else {
            self.error.to_string()
        };

        let mut data = self.error.details();
        if expose_details && code == ErrorCode::SERVER_ERROR {
            data = Some(serde_json::json!({ "detail": self.error.to_string() }));
        }

        let body = match self.envelope {
            Envelope::Public => serde_json::json!({ "code": code.code, "msg": message, "data": data }),
            Envelope::Admin => serde_json::json!({ "success": false, "message": message, "data": data }),
        };

        let mut response = (http_status(code), Json(body)).into_response();
        response.extensions_mut().insert(self.clone());
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ErrorReport {
            error: Arc::new(self.error),
            envelope: self.envelope,
        }
        .render(false)
    }
}

/// HTTP status for an error code
pub fn http_status(code: ErrorCode) -> StatusCode {
    match code.code {
        0 => StatusCode::OK,
        400 => StatusCode::BAD_REQUEST,
        401 => StatusCode::UNAUTHORIZED,
        403 => StatusCode::FORBIDDEN,
        404 | 801 | 810 => StatusCode::NOT_FOUND,
        802 | 807 => StatusCode::CONFLICT,
        500 => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

/// Bad request in the public envelope, for rejected extractor input
pub fn param_error(message: impl Into<String>) -> ApiError {
    ApiError::from(CampusWallError::InvalidInput(message.into()))
}
