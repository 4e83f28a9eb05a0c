//! In-process backing store.
//!
//! [`MemoryDatabase`] keeps events and bookings in a single
//! [`tokio::sync::RwLock`]-guarded table set. Every write takes the write
//! lock once, so each commit is atomic and the slug index is checked and
//! updated in the same critical section as the row itself.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{Connector, Database, EventStream};
use crate::domain::{Booking, Event, EventId, Slug, SortOrder};
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Tables {
    /// Insertion order.
    events: Vec<Event>,
    slugs: HashMap<Slug, EventId>,
    bookings: Vec<Booking>,
}

impl Tables {
    fn event(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    fn slug_holder(&self, slug: &Slug) -> Option<EventId> {
        self.slugs.get(slug).copied()
    }
}

/// Event and booking tables held in process memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryDatabase {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored events.
    pub async fn event_count(&self) -> usize {
        self.tables.read().await.events.len()
    }

    /// Returns the number of stored bookings across all events.
    pub async fn booking_count(&self) -> usize {
        self.tables.read().await.bookings.len()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn slug_taken(&self, slug: &Slug, excluding: EventId) -> Result<bool, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.slug_holder(slug).is_some_and(|id| id != excluding))
    }

    async fn insert_event(&self, event: &Event) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.slug_holder(&event.slug).is_some() {
            return Err(StoreError::DuplicateSlug(event.slug.to_string()));
        }
        if tables.event(event.id).is_some() {
            return Err(StoreError::Internal(format!("event {} already exists", event.id)));
        }
        tables.slugs.insert(event.slug.clone(), event.id);
        tables.events.push(event.clone());
        Ok(())
    }

    async fn update_event(
        &self,
        event: &Event,
        expected: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(position) = tables.events.iter().position(|e| e.id == event.id) else {
            return Err(StoreError::EventNotFound(event.id));
        };
        if tables
            .events
            .get(position)
            .is_some_and(|stored| stored.updated_at != expected)
        {
            return Ok(false);
        }
        if tables
            .slug_holder(&event.slug)
            .is_some_and(|holder| holder != event.id)
        {
            return Err(StoreError::DuplicateSlug(event.slug.to_string()));
        }
        let previous = std::mem::replace(
            tables
                .events
                .get_mut(position)
                .ok_or(StoreError::EventNotFound(event.id))?,
            event.clone(),
        );
        if previous.slug != event.slug {
            tables.slugs.remove(&previous.slug);
            tables.slugs.insert(event.slug.clone(), event.id);
        }
        Ok(true)
    }

    async fn find_event_by_slug(&self, slug: &Slug) -> Result<Option<Event>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .slug_holder(slug)
            .and_then(|id| tables.event(id))
            .cloned())
    }

    async fn find_event_by_id(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        Ok(self.tables.read().await.event(id).cloned())
    }

    async fn event_exists(&self, id: EventId) -> Result<bool, StoreError> {
        Ok(self.tables.read().await.event(id).is_some())
    }

    fn list_events(&self, order: SortOrder) -> EventStream {
        let tables = Arc::clone(&self.tables);
        Box::pin(async_stream::stream! {
            let snapshot = {
                let tables = tables.read().await;
                let mut events = tables.events.clone();
                match order {
                    SortOrder::OldestFirst => events.sort_by_key(|e| e.created_at),
                    SortOrder::NewestFirst => {
                        events.reverse();
                        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                    }
                }
                events
            };
            for event in snapshot {
                yield Ok::<Event, StoreError>(event);
            }
        })
    }

    async fn events_sharing_tags(
        &self,
        tags: &[String],
        excluding: EventId,
    ) -> Result<Vec<Event>, StoreError> {
        let tables = self.tables.read().await;
        let mut similar: Vec<Event> = tables
            .events
            .iter()
            .rev()
            .filter(|e| e.id != excluding && e.shares_tag_with(tags))
            .cloned()
            .collect();
        similar.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(similar)
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.event(booking.event_id).is_none() {
            return Err(StoreError::EventNotFound(booking.event_id));
        }
        tables.bookings.push(booking.clone());
        Ok(())
    }

    async fn bookings_for_event(&self, event_id: EventId) -> Result<Vec<Booking>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .iter()
            .filter(|b| b.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn count_bookings_for_event(&self, event_id: EventId) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        let count = tables
            .bookings
            .iter()
            .filter(|b| b.event_id == event_id)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}

/// Connector producing [`MemoryDatabase`] handles.
///
/// Counts connection attempts and can be told to fail or stall, which lets
/// tests observe how the [`super::ConnectionManager`] collapses attempts.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    attempts: AtomicUsize,
    failures_left: AtomicUsize,
    latency: Option<Duration>,
    database: MemoryDatabase,
}

impl MemoryConnector {
    /// Creates a connector that always succeeds immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every attempt by `latency` before it resolves.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes the next `n` attempts fail with a connection failure.
    #[must_use]
    pub fn failing_next(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    /// Number of physical connection attempts made so far.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// The store every successful attempt connects to.
    #[must_use]
    pub fn database(&self) -> &MemoryDatabase {
        &self.database
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, target: &str) -> Result<Arc<dyn Database>, StoreError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(target, attempt, "opening in-memory store");
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(StoreError::ConnectionFailure(format!(
                "in-memory store refused attempt {attempt}"
            )));
        }
        Ok(Arc::new(self.database.clone()))
    }
}
