//! Public event endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::handlers::extract::{JsonBody, PathParams, QueryParams};
use crate::handlers::response::{ApiError, ApiResponse};
use crate::middleware::AuthUser;
use crate::models::{
    CancelRegistrationRequest, ChangeEventStatusRequest, CreateEventRequest, Event, EventFilter,
    EventRegistration, Page, RegisterRequest, RegistrationStatusView, UpdateEventRequest,
};
use crate::state::AppState;

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub async fn list_events(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<EventFilter>,
) -> ApiResult<Page<Event>> {
    let page = state.services.event_service.list_events(&filter).await?;
    Ok(ApiResponse::ok(page))
}

pub async fn get_event(
    State(state): State<AppState>,
    PathParams(event_id): PathParams<i64>,
) -> ApiResult<Event> {
    let event = state.services.event_service.get_event(event_id).await?;
    Ok(ApiResponse::ok(event))
}

pub async fn create_event(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    JsonBody(request): JsonBody<CreateEventRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Event>>), ApiError> {
    let event = state.services.event_service.create_event(&ctx, request).await?;
    Ok(ApiResponse::created(event))
}

pub async fn update_event(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    PathParams(event_id): PathParams<i64>,
    JsonBody(request): JsonBody<UpdateEventRequest>,
) -> ApiResult<Event> {
    let event = state.services.event_service.update_event(&ctx, event_id, request).await?;
    Ok(ApiResponse::ok(event))
}

pub async fn change_event_status(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    PathParams(event_id): PathParams<i64>,
    JsonBody(request): JsonBody<ChangeEventStatusRequest>,
) -> ApiResult<Event> {
    let event = state
        .services
        .event_service
        .change_status(&ctx, event_id, request.status)
        .await?;
    Ok(ApiResponse::ok(event))
}

pub async fn register(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    PathParams(event_id): PathParams<i64>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<EventRegistration>>), ApiError> {
    let registration = state
        .services
        .event_service
        .register_event(event_id, ctx.user_id, request.form_data)
        .await?;
    Ok(ApiResponse::created(registration))
}

pub async fn cancel_registration(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    PathParams(event_id): PathParams<i64>,
    JsonBody(request): JsonBody<CancelRegistrationRequest>,
) -> ApiResult<EventRegistration> {
    let registration = state
        .services
        .event_service
        .cancel_registration(event_id, ctx.user_id, request)
        .await?;
    Ok(ApiResponse::ok(registration))
}

pub async fn registration_status(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    PathParams(event_id): PathParams<i64>,
) -> ApiResult<RegistrationStatusView> {
    let view = state
        .services
        .event_service
        .registration_status(event_id, ctx.user_id)
        .await?;
    Ok(ApiResponse::ok(view))
}

pub async fn my_registrations(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> ApiResult<Vec<EventRegistration>> {
    let registrations = state.services.event_service.my_registrations(ctx.user_id).await?;
    Ok(ApiResponse::ok(registrations))
}
