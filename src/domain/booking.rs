//! Booking records: one attendee's interest in one event.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BookingId, EventId};

/// Normalized attendee mailbox (trimmed, lowercase, `local@domain.tld`).
///
/// Built by [`super::normalize::normalize_email`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "ada@example.com")]
pub struct Email(String);

impl Email {
    pub(crate) fn from_normalized(value: String) -> Self {
        Self(value)
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted booking.
///
/// `event_id` is a non-owning reference: the event's lifecycle is not
/// tied to its bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    /// Server-assigned identity.
    pub id: BookingId,
    /// The booked event.
    pub event_id: EventId,
    /// Attendee email.
    pub email: Email,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last modification instant.
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Builds a new booking stamped with the current time.
    #[must_use]
    pub fn new(event_id: EventId, email: Email) -> Self {
        let now = super::stored_now();
        Self {
            id: BookingId::new(),
            event_id,
            email,
            created_at: now,
            updated_at: now,
        }
    }
}
