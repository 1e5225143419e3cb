//! Logging middleware
//!
//! Logs one line per HTTP request and reports failed requests at a level
//! matching the error severity.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

use crate::handlers::response::ErrorReport;
use crate::middleware::auth::caller_id;
use crate::state::AppState;
use crate::utils::helpers::generate_request_id;
use crate::utils::logging::log_request_error;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Requests slower than this are logged at warn level
const SLOW_REQUEST_MS: u128 = 1000;

pub async fn log_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let user_id = caller_id(request.headers(), &state);
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(generate_request_id);

    let mut response = next.run(request).await;

    if let Some(report) = response.extensions().get::<ErrorReport>().cloned() {
        log_request_error(&report.error, &path);
        if state.expose_error_details() {
            response = report.render(true);
        }
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let latency_ms = started.elapsed().as_millis();
    let status = response.status().as_u16();
    if latency_ms > SLOW_REQUEST_MS {
        warn!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status,
            latency_ms = latency_ms as u64,
            user_id = user_id,
            "Slow request"
        );
    } else {
        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status,
            latency_ms = latency_ms as u64,
            user_id = user_id,
            "Request completed"
        );
    }

    response
}
