//! Database row models for events and bookings.
//!
//! Rows mirror the table columns one-to-one and convert into the domain
//! records. Conversion re-checks nothing: values were canonicalized before
//! they were written.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::domain::normalize::normalize_email;
use crate::domain::{Booking, BookingId, Event, EventDetails, EventId, Slug};
use crate::error::StoreError;

/// A stored row from the `events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// Primary key.
    pub id: Uuid,
    /// Uniquely indexed slug.
    pub slug: String,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Overview.
    pub overview: String,
    /// Hosted image URL.
    pub image: String,
    /// Venue.
    pub venue: String,
    /// Location.
    pub location: String,
    /// `DATE` column.
    pub date: NaiveDate,
    /// `TIME` column, seconds always zero.
    pub time: NaiveTime,
    /// Mode.
    pub mode: String,
    /// Audience.
    pub audience: String,
    /// `TEXT[]` agenda.
    pub agenda: Vec<String>,
    /// Organizer.
    pub organizer: String,
    /// `TEXT[]` tags.
    pub tags: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId::from_uuid(row.id),
            slug: Slug::from_stored(row.slug),
            details: EventDetails {
                title: row.title,
                description: row.description,
                overview: row.overview,
                image: row.image,
                venue: row.venue,
                location: row.location,
                date: row.date.into(),
                time: row.time.into(),
                mode: row.mode,
                audience: row.audience,
                agenda: row.agenda,
                organizer: row.organizer,
                tags: row.tags,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A stored row from the `bookings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    /// Primary key.
    pub id: Uuid,
    /// Indexed foreign key to `events.id`.
    pub event_id: Uuid,
    /// Normalized email.
    pub email: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: BookingId::from_uuid(row.id),
            event_id: EventId::from_uuid(row.event_id),
            email: normalize_email(&row.email)
                .map_err(|e| StoreError::Internal(format!("corrupt booking {}: {e}", row.id)))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
