//! HTTP handlers module
//!
//! Route table for the public and admin APIs.

pub mod admin;
pub mod events;
pub mod extract;
pub mod response;

use std::time::Duration;

use axum::{
    extract::State,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, StatusCode, Uri,
    },
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::response::ApiError;
use crate::middleware::log_requests;
use crate::state::AppState;
use crate::utils::errors::CampusWallError;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let public = Router::new()
        .route("/api/events", get(events::list_events).post(events::create_event))
        .route("/api/events/{id}", get(events::get_event).put(events::update_event))
        .route("/api/events/{id}/status", put(events::change_event_status))
        .route(
            "/api/events/{id}/register",
            post(events::register).delete(events::cancel_registration),
        )
        .route("/api/events/{id}/registration-status", get(events::registration_status))
        .route("/api/users/me/registrations", get(events::my_registrations));

    let admin = Router::new()
        .route("/api/admin/events/{id}/registrations", get(admin::list_registrations))
        .route("/api/admin/events/{id}/registrations/stats", get(admin::registration_stats))
        .route("/api/admin/events/{id}/registrations/export", get(admin::export_registrations))
        .route("/api/admin/events/{id}/registrations/batch-status", put(admin::batch_update_status))
        .route(
            "/api/admin/events/{id}/registrations/{registration_id}/status",
            put(admin::update_registration_status),
        )
        .route("/api/admin/registrations/{registration_id}/check-in", post(admin::check_in))
        .route_layer(middleware::map_response(admin::admin_envelope));

    Router::new()
        .route("/health", get(health))
        .merge(public)
        .merge(admin)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::from(CampusWallError::NotFound(uri.path().to_string()))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let status = state.services.health_check().await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(json!({
            "status": if status.is_healthy() { "ok" } else { "degraded" },
            "version": crate::VERSION,
            "services": status,
            "issues": status.get_issues(),
        })),
    )
}
