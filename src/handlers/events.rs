//! Event endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use crate::handlers::{ApiResponse, ApiResult};
use crate::middleware::auth::{CurrentUser, SessionContext};
use crate::models::event::{CreateEventRequest, Event, UpdateEventRequest};
use crate::models::views::{ConfirmationOutcome, CreatedEvent, EventDetailView, EventView};
use crate::state::AppContext;
use crate::utils::errors::PlanlyError;

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub slot_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct AttendQuery {
    #[serde(default)]
    pub before: bool,
}

/// POST /api/events
pub async fn create_event(
    State(ctx): State<AppContext>,
    SessionContext(session): SessionContext,
    Json(request): Json<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CreatedEvent>>)> {
    let created = ctx.services.lifecycle_service.create_event(&session, request).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok("Event created", created)))
}

/// GET /api/events/:id
pub async fn get_event(
    State(ctx): State<AppContext>,
    SessionContext(session): SessionContext,
    Path(event_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<EventDetailView>>> {
    let view = ctx
        .services
        .query_service
        .get_event_by_id(event_id, session.user_id())
        .await?
        .ok_or(PlanlyError::EventNotFound { event_id })?;

    Ok(ApiResponse::ok("Event found", view))
}

/// PUT /api/events/:id
pub async fn update_event(
    State(ctx): State<AppContext>,
    SessionContext(session): SessionContext,
    Path(event_id): Path<i64>,
    Json(request): Json<UpdateEventRequest>,
) -> ApiResult<Json<ApiResponse<Event>>> {
    let event = ctx.services.lifecycle_service.update_event(&session, event_id, request).await?;
    Ok(ApiResponse::ok("Event updated", event))
}

/// DELETE /api/events/:id
pub async fn delete_event(
    State(ctx): State<AppContext>,
    SessionContext(session): SessionContext,
    Path(event_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<()>>> {
    ctx.services.lifecycle_service.delete_event(&session, event_id).await?;
    Ok(ApiResponse::done("Event deleted"))
}

/// POST /api/events/:id/confirm
pub async fn confirm_event(
    State(ctx): State<AppContext>,
    SessionContext(session): SessionContext,
    Path(event_id): Path<i64>,
    Json(request): Json<ConfirmRequest>,
) -> ApiResult<Json<ApiResponse<ConfirmationOutcome>>> {
    let outcome = ctx
        .services
        .lifecycle_service
        .confirm_event(&session, event_id, request.slot_id)
        .await?;

    let message = if outcome.newly_confirmed {
        "Event confirmed"
    } else {
        "Event was already confirmed on this slot"
    };
    Ok(ApiResponse::ok(message, outcome))
}

/// GET /api/events/mine
pub async fn my_events(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<ApiResponse<Vec<EventView>>>> {
    let events = ctx.services.query_service.get_my_events(&user.id).await?;
    Ok(ApiResponse::ok("Events created by you", events))
}

/// GET /api/events/upcoming
pub async fn upcoming_events(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<ApiResponse<Vec<EventView>>>> {
    let events = ctx.services.query_service.get_upcoming_events(&user.id).await?;
    Ok(ApiResponse::ok("Upcoming events", events))
}

/// GET /api/events/past
pub async fn past_events(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<ApiResponse<Vec<EventView>>>> {
    let events = ctx.services.query_service.get_past_events(&user.id).await?;
    Ok(ApiResponse::ok("Past events", events))
}

/// GET /api/events/attending?before=bool
pub async fn attend_events(
    State(ctx): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<AttendQuery>,
) -> ApiResult<Json<ApiResponse<Vec<EventView>>>> {
    let events = ctx.services.query_service.get_attend_events(query.before, &user.id).await?;
    Ok(ApiResponse::ok("Confirmed events", events))
}
