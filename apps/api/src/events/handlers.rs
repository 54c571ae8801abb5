//! Axum route handlers for the calendar.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::events::queries::{
    delete_event, find_event, insert_event, list_events, month_range, update_event, EventFields,
};
use crate::models::event::{EventRow, DEFAULT_EVENT_COLOR};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    pub month: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub events: Vec<EventRow>,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub event: EventRow,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// RFC 3339 timestamps, or a bare `YYYY-MM-DDTHH:MM[:SS]` read as UTC
/// (what `<input type="datetime-local">` submits).
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn timestamp_field(value: &str, field: &str) -> Result<DateTime<Utc>, AppError> {
    parse_timestamp(value).ok_or_else(|| AppError::Validation(format!("Invalid {field}")))
}

fn check_order(fields: &EventFields) -> Result<(), AppError> {
    if fields.end_time < fields.start_time {
        return Err(AppError::Validation(
            "End time must be after start time".to_string(),
        ));
    }
    Ok(())
}

/// Month filtering applies only when both `month` and `year` are given.
fn parse_month_filter(
    query: &ListEventsQuery,
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, AppError> {
    let (Some(month), Some(year)) = (non_blank(query.month.clone()), non_blank(query.year.clone()))
    else {
        return Ok(None);
    };

    let month: u32 = month
        .parse()
        .map_err(|_| AppError::Validation("Invalid month".to_string()))?;
    let year: i32 = year
        .parse()
        .map_err(|_| AppError::Validation("Invalid year".to_string()))?;

    month_range(year, month)
        .map(Some)
        .ok_or_else(|| AppError::Validation("Invalid month".to_string()))
}

fn validate_new_event(request: CreateEventRequest) -> Result<EventFields, AppError> {
    let (Some(title), Some(start), Some(end)) = (
        non_blank(request.title),
        non_blank(request.start_time),
        non_blank(request.end_time),
    ) else {
        return Err(AppError::Validation(
            "Title, start time, and end time are required".to_string(),
        ));
    };

    let fields = EventFields {
        title,
        description: non_blank(request.description),
        start_time: timestamp_field(&start, "start time")?,
        end_time: timestamp_field(&end, "end time")?,
        location: non_blank(request.location),
        color: non_blank(request.color).unwrap_or_else(|| DEFAULT_EVENT_COLOR.to_string()),
    };
    check_order(&fields)?;
    Ok(fields)
}

/// Merges a partial update into the stored event. Blank title, color and
/// times are ignored; a blank description or location clears it.
fn apply_update(current: &EventRow, request: UpdateEventRequest) -> Result<EventFields, AppError> {
    let mut fields = EventFields::from(current);

    if let Some(title) = non_blank(request.title) {
        fields.title = title;
    }
    if let Some(description) = request.description {
        fields.description = non_blank(Some(description));
    }
    if let Some(start) = non_blank(request.start_time) {
        fields.start_time = timestamp_field(&start, "start time")?;
    }
    if let Some(end) = non_blank(request.end_time) {
        fields.end_time = timestamp_field(&end, "end time")?;
    }
    if let Some(location) = request.location {
        fields.location = non_blank(Some(location));
    }
    if let Some(color) = non_blank(request.color) {
        fields.color = color;
    }

    check_order(&fields)?;
    Ok(fields)
}

/// Missing and foreign events are indistinguishable to the caller.
async fn load_own_event(state: &AppState, auth: &AuthUser, id: Uuid) -> Result<EventRow, AppError> {
    match find_event(&state.db, id).await? {
        Some(event) if event.user_id == auth.user_id => Ok(event),
        _ => Err(AppError::Forbidden),
    }
}

/// GET /api/events
pub async fn handle_list_events(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListEventsQuery>,
) -> Result<Json<EventListResponse>, AppError> {
    let range = parse_month_filter(&query)?;
    let events = list_events(&state.db, auth.user_id, range).await?;
    Ok(Json(EventListResponse { events }))
}

/// POST /api/events
pub async fn handle_create_event(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(request): JsonBody<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), AppError> {
    let fields = validate_new_event(request)?;
    let event = insert_event(&state.db, auth.user_id, &fields).await?;

    info!(event_id = %event.id, user_id = %auth.user_id, "event created");
    Ok((StatusCode::CREATED, Json(EventResponse { event })))
}

/// PATCH /api/events/:id
pub async fn handle_update_event(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(request): JsonBody<UpdateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    let current = load_own_event(&state, &auth, id).await?;
    let fields = apply_update(&current, request)?;
    let event = update_event(&state.db, id, &fields).await?;

    info!(event_id = %id, user_id = %auth.user_id, "event updated");
    Ok(Json(EventResponse { event }))
}

/// DELETE /api/events/:id
pub async fn handle_delete_event(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParam(id): PathParam<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    load_own_event(&state, &auth, id).await?;
    delete_event(&state.db, id).await?;

    info!(event_id = %id, user_id = %auth.user_id, "event deleted");
    Ok(Json(MessageResponse {
        message: "Event deleted".to_string(),
    }))
}
