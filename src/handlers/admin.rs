//! Admin registration endpoints
//!
//! Open to admins and to the organizer of the event in question.

use axum::{
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::handlers::extract::{JsonBody, PathParams, QueryParams};
use crate::handlers::response::{AdminResponse, ApiError, Envelope, ErrorReport};
use crate::middleware::AuthUser;
use crate::models::{
    BatchUpdateStatusRequest, EventRegistration, Page, RegistrationFilter, RegistrationStats,
    UpdateRegistrationStatusRequest,
};
use crate::services::ExportFile;
use crate::state::AppState;

type AdminResult<T> = Result<Json<AdminResponse<T>>, ApiError>;

/// Re-render extractor rejections of admin routes in the admin envelope
pub async fn admin_envelope(response: Response) -> Response {
    let report = response
        .extensions()
        .get::<ErrorReport>()
        .filter(|report| report.envelope == Envelope::Public)
        .cloned();

    match report {
        Some(report) => ErrorReport { envelope: Envelope::Admin, ..report }.render(false),
        None => response,
    }
}

#[derive(Debug, Serialize)]
pub struct BatchUpdateResult {
    pub updated: u64,
}

pub async fn list_registrations(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    PathParams(event_id): PathParams<i64>,
    QueryParams(filter): QueryParams<RegistrationFilter>,
) -> AdminResult<Page<EventRegistration>> {
    let page = state
        .services
        .registration_service
        .list_registrations(&ctx, event_id, &filter)
        .await
        .map_err(ApiError::admin)?;
    Ok(AdminResponse::ok("ok", page))
}

pub async fn registration_stats(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    PathParams(event_id): PathParams<i64>,
) -> AdminResult<RegistrationStats> {
    let stats = state
        .services
        .registration_service
        .statistics(&ctx, event_id)
        .await
        .map_err(ApiError::admin)?;
    Ok(AdminResponse::ok("ok", stats))
}

pub async fn update_registration_status(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    PathParams((event_id, registration_id)): PathParams<(i64, i64)>,
    JsonBody(request): JsonBody<UpdateRegistrationStatusRequest>,
) -> AdminResult<EventRegistration> {
    let registration = state
        .services
        .registration_service
        .update_status(&ctx, event_id, registration_id, request.status)
        .await
        .map_err(ApiError::admin)?;
    Ok(AdminResponse::ok("Registration status updated", registration))
}

pub async fn batch_update_status(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    PathParams(event_id): PathParams<i64>,
    JsonBody(request): JsonBody<BatchUpdateStatusRequest>,
) -> AdminResult<BatchUpdateResult> {
    let updated = state
        .services
        .registration_service
        .batch_update_status(&ctx, event_id, request)
        .await
        .map_err(ApiError::admin)?;
    Ok(AdminResponse::ok(
        format!("{} registrations updated", updated),
        BatchUpdateResult { updated },
    ))
}

pub async fn check_in(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    PathParams(registration_id): PathParams<i64>,
) -> AdminResult<EventRegistration> {
    let registration = state
        .services
        .registration_service
        .check_in(&ctx, registration_id)
        .await
        .map_err(ApiError::admin)?;
    Ok(AdminResponse::ok("Checked in", registration))
}

pub async fn export_registrations(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    PathParams(event_id): PathParams<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let file = state
        .services
        .registration_service
        .export(&ctx, event_id)
        .await
        .map_err(ApiError::admin)?;

    let disposition = file.content_disposition();
    Ok((
        [
            (CONTENT_TYPE, ExportFile::CONTENT_TYPE.to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        file.content,
    ))
}
