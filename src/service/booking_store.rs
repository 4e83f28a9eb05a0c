//! Booking lifecycle.

use std::sync::Arc;

use crate::domain::normalize::normalize_email;
use crate::domain::{Booking, EventId};
use crate::error::StoreError;
use crate::persistence::ConnectionManager;

/// Records attendee bookings against existing events.
#[derive(Debug)]
pub struct BookingStore {
    connections: Arc<ConnectionManager>,
}

impl BookingStore {
    /// Creates a store drawing its handle from `connections`.
    #[must_use]
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    /// Books `email` onto the event with `event_id`.
    ///
    /// The email is normalized before anything else. The event must exist
    /// when checked; the store's foreign key covers the gap between the
    /// check and the insert.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidEmail`] for a malformed address, before any I/O
    /// - [`StoreError::EventNotFound`] when the event does not exist
    pub async fn create(&self, event_id: EventId, email: &str) -> Result<Booking, StoreError> {
        let email = normalize_email(email)?;
        let db = self.connections.acquire().await?;

        if !db.event_exists(event_id).await? {
            return Err(StoreError::EventNotFound(event_id));
        }

        let booking = Booking::new(event_id, email);
        db.insert_booking(&booking).await?;

        tracing::info!(booking_id = %booking.id, event_id = %event_id, "booking created");
        Ok(booking)
    }

    /// Returns the bookings of one event, oldest first.
    ///
    /// # Errors
    ///
    /// Returns connection or store errors.
    pub async fn list_for_event(&self, event_id: EventId) -> Result<Vec<Booking>, StoreError> {
        let db = self.connections.acquire().await?;
        db.bookings_for_event(event_id).await
    }

    /// Counts the bookings of one event.
    ///
    /// # Errors
    ///
    /// Returns connection or store errors.
    pub async fn count_for_event(&self, event_id: EventId) -> Result<u64, StoreError> {
        let db = self.connections.acquire().await?;
        db.count_bookings_for_event(event_id).await
    }
}
