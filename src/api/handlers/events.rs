//! Event handlers: create, list, get, update, similar.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::TryStreamExt;

use crate::api::dto::{EventListResponse, ListEventsParams};
use crate::app_state::AppState;
use crate::domain::{Event, EventId, EventUpdate, NewEvent, Slug};
use crate::error::{ErrorResponse, StoreError};

/// Parses an event id taken from the request.
pub(crate) fn parse_event_id(raw: &str, field: &'static str) -> Result<EventId, StoreError> {
    raw.parse().map_err(|e: uuid::Error| StoreError::ValidationFailed {
        field,
        reason: e.to_string(),
    })
}

/// Resolves a route slug to its event or a `NotFound`.
pub(crate) async fn event_at(state: &AppState, raw: &str) -> Result<Event, StoreError> {
    let slug = Slug::parse(raw)?;
    state
        .events
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| StoreError::NotFound {
            resource: "event",
            key: slug.to_string(),
        })
}

/// `POST /events`: Create a new event.
///
/// # Errors
///
/// Returns [`StoreError`] on invalid fields or a slug conflict.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Create an event",
    description = "Validates and normalizes every field, assigns a unique slug derived from the title and stores the event. `image` must already be a hosted URL.",
    request_body = NewEvent,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Invalid or missing field", body = ErrorResponse),
        (status = 409, description = "No unique slug could be committed", body = ErrorResponse),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    Json(raw): Json<NewEvent>,
) -> Result<impl IntoResponse, StoreError> {
    let event = state.events.create(&raw).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /events`: List all events.
///
/// # Errors
///
/// Returns [`StoreError`] on store failures.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    summary = "List events",
    description = "Returns every event ordered by creation time, newest first unless `order=oldest`.",
    params(ListEventsParams),
    responses(
        (status = 200, description = "Event list", body = EventListResponse),
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<ListEventsParams>,
) -> Result<impl IntoResponse, StoreError> {
    let events: Vec<Event> = state
        .events
        .list_all(params.order.into())
        .await?
        .try_collect()
        .await?;
    Ok(Json(EventListResponse::from(events)))
}

/// `GET /events/{slug}`: Get one event.
///
/// # Errors
///
/// Returns [`StoreError::InvalidSlug`] or [`StoreError::NotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/events/{slug}",
    tag = "Events",
    summary = "Get an event by slug",
    description = "Slugs are case-insensitive and must match `^[a-z0-9]+(-[a-z0-9]+)*$`.",
    params(
        ("slug" = String, Path, description = "Event slug"),
    ),
    responses(
        (status = 200, description = "Event details", body = Event),
        (status = 400, description = "Malformed slug", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, StoreError> {
    Ok(Json(event_at(&state, &slug).await?))
}

/// `PATCH /events/{id}`: Update an event.
///
/// # Errors
///
/// Returns [`StoreError::EventNotFound`] or a validation error.
#[utoipa::path(
    patch,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Update an event",
    description = "Applies the given fields and re-validates the whole event. The slug changes only when the title does.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    request_body = EventUpdate,
    responses(
        (status = 200, description = "Updated event", body = Event),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "No unique slug could be committed, or the event kept changing concurrently", body = ErrorResponse),
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<EventUpdate>,
) -> Result<impl IntoResponse, StoreError> {
    let id = parse_event_id(&id, "id")?;
    Ok(Json(state.events.update(id, &patch).await?))
}

/// `GET /events/{slug}/similar`: Events sharing a tag.
///
/// # Errors
///
/// Returns [`StoreError::InvalidSlug`] on a malformed slug.
#[utoipa::path(
    get,
    path = "/api/v1/events/{slug}/similar",
    tag = "Events",
    summary = "List similar events",
    description = "Returns other events sharing at least one tag, newest first. An unknown slug yields an empty list.",
    params(
        ("slug" = String, Path, description = "Event slug"),
    ),
    responses(
        (status = 200, description = "Similar events", body = EventListResponse),
        (status = 400, description = "Malformed slug", body = ErrorResponse),
    )
)]
pub async fn similar_events(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, StoreError> {
    let slug = Slug::parse(&slug)?;
    let events = state.events.find_similar_by_slug(&slug).await?;
    Ok(Json(EventListResponse::from(events)))
}

/// Event routes. `{slug}` doubles as the id segment for `PATCH`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        // axum rejects two names for one segment; PATCH reads it as the
        // event id and is documented as `/events/{id}`.
        .route("/events/{slug}", get(get_event).patch(update_event))
        .route("/events/{slug}/similar", get(similar_events))
}
