//! OpenAPI document for the REST API.

use utoipa::OpenApi;

use super::dto::{BookingListResponse, CreateBookingRequest, EventListResponse, OrderParam};
use super::handlers::{bookings, events, system};
use crate::domain::{Booking, Email, Event, EventDate, EventDetails, EventTime, EventUpdate, NewEvent};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI specification covering every route.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "devevent-gateway",
        description = "Publish developer events and collect bookings."
    ),
    paths(
        system::health_handler,
        events::create_event,
        events::list_events,
        events::get_event,
        events::update_event,
        events::similar_events,
        bookings::create_booking,
        bookings::list_event_bookings,
    ),
    components(schemas(
        Event,
        EventDetails,
        EventDate,
        EventTime,
        NewEvent,
        EventUpdate,
        Booking,
        Email,
        EventListResponse,
        BookingListResponse,
        CreateBookingRequest,
        OrderParam,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
    )),
    tags(
        (name = "System", description = "Service health"),
        (name = "Events", description = "Event lifecycle"),
        (name = "Bookings", description = "Attendee bookings"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/v1/events",
            "/api/v1/events/{slug}",
            "/api/v1/events/{id}",
            "/api/v1/events/{slug}/similar",
            "/api/v1/bookings",
            "/api/v1/events/{slug}/bookings",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
