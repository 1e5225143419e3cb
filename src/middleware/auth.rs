//! Authentication middleware
//!
//! Extractors that turn the `Authorization` header into the caller's
//! identity for protected routes.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

use crate::handlers::response::ApiError;
use crate::services::AuthContext;
use crate::state::AppState;

/// Authenticated caller of a protected route
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub AuthContext);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        let ctx = state.services.auth_service.authenticate_header(header)?;

        debug!(user_id = ctx.user_id, role = ?ctx.role, "Request authenticated");
        Ok(AuthUser(ctx))
    }
}

/// Caller id when a valid token is present, for logging only
pub fn caller_id(headers: &axum::http::HeaderMap, state: &AppState) -> Option<i64> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    state
        .services
        .auth_service
        .authenticate_header(header)
        .ok()
        .map(|ctx| ctx.user_id)
}
