//! Booking handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::events::{event_at, parse_event_id};
use crate::api::dto::{BookingListResponse, CreateBookingRequest};
use crate::app_state::AppState;
use crate::domain::Booking;
use crate::error::{ErrorResponse, StoreError};

/// `POST /bookings`: Book an attendee onto an event.
///
/// # Errors
///
/// Returns [`StoreError::InvalidEmail`] or [`StoreError::EventNotFound`].
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    summary = "Create a booking",
    description = "Normalizes the email and records the booking if the event exists.",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = Booking),
        (status = 400, description = "Malformed event id or email", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, StoreError> {
    let event_id = parse_event_id(&req.event_id, "event_id")?;
    let booking = state.bookings.create(event_id, &req.email).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// `GET /events/{slug}/bookings`: Bookings of one event.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] when the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{slug}/bookings",
    tag = "Bookings",
    summary = "List bookings for an event",
    params(
        ("slug" = String, Path, description = "Event slug"),
    ),
    responses(
        (status = 200, description = "Bookings and total count", body = BookingListResponse),
        (status = 400, description = "Malformed slug", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn list_event_bookings(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, StoreError> {
    let event = event_at(&state, &slug).await?;
    let bookings = state.bookings.list_for_event(event.id).await?;
    let count = state.bookings.count_for_event(event.id).await?;
    Ok(Json(BookingListResponse {
        event_id: event.id,
        bookings,
        count,
    }))
}

/// Booking routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/events/{slug}/bookings", get(list_event_bookings))
}
