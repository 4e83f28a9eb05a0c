//! Booking request and response bodies.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Booking, EventId};

/// Request body for `POST /bookings`.
///
/// `event_id` is kept as text so a malformed id is reported as a
/// validation error on that field.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateBookingRequest {
    /// Identity of the event to book.
    #[schema(example = "0b7e6f5c-2d7a-4c1e-9a51-3f2f3c1d9e10")]
    pub event_id: String,
    /// Attendee email; trimmed and lowercased before storage.
    #[schema(example = "ada@example.com")]
    pub email: String,
}

/// Response for `GET /events/{slug}/bookings`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingListResponse {
    /// The event the bookings belong to.
    pub event_id: EventId,
    /// Bookings, oldest first.
    pub bookings: Vec<Booking>,
    /// Total bookings for the event.
    pub count: u64,
}
