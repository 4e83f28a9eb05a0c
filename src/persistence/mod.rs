//! Persistence layer: the backing store seam and connection lifecycle.
//!
//! [`Database`] is the handle every store operation runs against. Handles
//! are produced by a [`Connector`] and shared process-wide through the
//! [`ConnectionManager`], which guarantees one physical connection attempt
//! at a time. Two backends are provided: PostgreSQL via `sqlx::PgPool` and
//! an in-process store used by tests and database-less runs.

pub mod connection;
pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;

pub use connection::{ConnectionManager, Connector, connector_for};
pub use memory::{MemoryConnector, MemoryDatabase};
pub use postgres::{PgConnector, PgDatabase};

use crate::domain::{Booking, Event, EventId, Slug, SortOrder};
use crate::error::StoreError;

/// Lazily produced sequence of events. Finite; a fresh one per call.
pub type EventStream = BoxStream<'static, Result<Event, StoreError>>;

/// Operations the stores need from a backing database.
///
/// Every write is a single atomic commit. Implementations enforce slug
/// uniqueness themselves: a write that would duplicate a slug fails with
/// [`StoreError::DuplicateSlug`] and leaves the store unchanged.
#[async_trait]
pub trait Database: Send + Sync + std::fmt::Debug {
    /// Returns `true` when an event other than `excluding` holds `slug`.
    async fn slug_taken(&self, slug: &Slug, excluding: EventId) -> Result<bool, StoreError>;

    /// Inserts a new event.
    async fn insert_event(&self, event: &Event) -> Result<(), StoreError>;

    /// Replaces every mutable column of an existing event, but only while
    /// its stored `updated_at` still equals `expected`.
    ///
    /// Returns `Ok(false)` and writes nothing when the row moved on since
    /// it was read. Fails with [`StoreError::EventNotFound`] when no row
    /// has `event.id`.
    async fn update_event(
        &self,
        event: &Event,
        expected: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Looks up an event by slug.
    async fn find_event_by_slug(&self, slug: &Slug) -> Result<Option<Event>, StoreError>;

    /// Looks up an event by identity.
    async fn find_event_by_id(&self, id: EventId) -> Result<Option<Event>, StoreError>;

    /// Returns `true` when an event with `id` exists.
    async fn event_exists(&self, id: EventId) -> Result<bool, StoreError>;

    /// Streams all events ordered by creation time.
    fn list_events(&self, order: SortOrder) -> EventStream;

    /// Returns events other than `excluding` carrying at least one of `tags`,
    /// newest first.
    async fn events_sharing_tags(
        &self,
        tags: &[String],
        excluding: EventId,
    ) -> Result<Vec<Event>, StoreError>;

    /// Inserts a new booking.
    ///
    /// Fails with [`StoreError::EventNotFound`] when the store itself
    /// detects a dangling event reference.
    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError>;

    /// Returns the bookings of one event, oldest first.
    async fn bookings_for_event(&self, event_id: EventId) -> Result<Vec<Booking>, StoreError>;

    /// Counts the bookings of one event.
    async fn count_bookings_for_event(&self, event_id: EventId) -> Result<u64, StoreError>;
}
