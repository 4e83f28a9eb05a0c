//! Domain layer: record types, identifiers and field normalization.
//!
//! Everything in this module is pure. Types here are the single plain
//! representation of each entity; the persistence layer stores and returns
//! them as-is.

pub mod booking;
pub mod event;
pub mod ids;
pub mod normalize;
pub mod slug;

pub use booking::{Booking, Email};
pub use event::{Event, EventDate, EventDetails, EventTime, EventUpdate, NewEvent, SortOrder};
pub use ids::{BookingId, EventId};
pub use slug::{Slug, slugify};

use chrono::{DateTime, SubsecRound, Utc};

/// Current instant truncated to microseconds, the precision stored
/// timestamps keep, so a returned record equals its stored copy.
#[must_use]
pub fn stored_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
