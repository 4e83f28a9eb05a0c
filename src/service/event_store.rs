//! Event lifecycle: validation, slug assignment and atomic commits.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use super::SlugAllocator;
use crate::config::SlugPolicy;
use crate::domain::{Event, EventId, EventUpdate, NewEvent, Slug, SortOrder, stored_now};
use crate::error::StoreError;
use crate::persistence::{ConnectionManager, Database, EventStream};

#[derive(Debug, Clone, Copy)]
enum Write {
    Insert,
    /// Carries the `updated_at` the record was read with.
    Update(DateTime<Utc>),
}

/// Timestamp for a rewrite of a record last stamped `previous`. Always
/// strictly later, so every committed update is observable to the next
/// compare-and-swap.
fn next_stamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = stored_now();
    if now > previous {
        now
    } else {
        previous + TimeDelta::microseconds(1)
    }
}

/// Creates, updates and reads events.
///
/// Every write validates the complete record before touching the store and
/// commits it in one statement, so a rejected or abandoned write leaves
/// nothing behind. Slug races between concurrent writers are settled by the
/// store's uniqueness constraint: the loser re-allocates and tries again,
/// up to [`SlugPolicy::commit_attempts`] times. Updates are conditional on
/// the `updated_at` they read, and an update that lost a race re-reads the
/// record and re-applies its patch under the same attempt limit.
#[derive(Debug)]
pub struct EventStore {
    connections: Arc<ConnectionManager>,
    allocator: SlugAllocator,
    commit_attempts: u32,
}

impl EventStore {
    /// Creates a store drawing its handle from `connections`.
    #[must_use]
    pub fn new(connections: Arc<ConnectionManager>, policy: SlugPolicy) -> Self {
        Self {
            connections,
            allocator: SlugAllocator::new(policy),
            commit_attempts: policy.commit_attempts.max(1),
        }
    }

    /// Validates `raw`, assigns a unique slug and persists the new event.
    ///
    /// # Errors
    ///
    /// - validation errors from [`NewEvent::validate`], before any I/O
    /// - [`StoreError::DuplicateSlug`] when no slug could be committed
    /// - connection errors from [`ConnectionManager::acquire`]
    pub async fn create(&self, raw: &NewEvent) -> Result<Event, StoreError> {
        let (details, base) = raw.validate()?;
        let db = self.connections.acquire().await?;

        let now = stored_now();
        let event = Event {
            id: EventId::new(),
            slug: base.clone(),
            details,
            created_at: now,
            updated_at: now,
        };
        let event = self
            .commit(db.as_ref(), event, Some(&base), Write::Insert)
            .await?;

        tracing::info!(event_id = %event.id, slug = %event.slug, "event created");
        Ok(event)
    }

    /// Applies `patch` to the event with `id`.
    ///
    /// The merged record is validated as a whole. The slug is recomputed
    /// only when the title changes. The write only lands on the version it
    /// was merged with; when another writer got there first the patch is
    /// merged again with the newer record.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EventNotFound`] when no event has `id`
    /// - validation errors for the merged record
    /// - [`StoreError::DuplicateSlug`] when a new slug could not be committed
    /// - [`StoreError::ConcurrentUpdate`] when every attempt lost a race
    pub async fn update(&self, id: EventId, patch: &EventUpdate) -> Result<Event, StoreError> {
        let db = self.connections.acquire().await?;
        let mut attempt: u32 = 1;
        loop {
            let current = db
                .find_event_by_id(id)
                .await?
                .ok_or(StoreError::EventNotFound(id))?;

            let (details, base) = patch.apply_to(&current.details).validate()?;
            let reslug = details.title != current.details.title;

            let event = Event {
                id,
                slug: current.slug.clone(),
                details,
                created_at: current.created_at,
                updated_at: next_stamp(current.updated_at),
            };
            let write = Write::Update(current.updated_at);
            match self
                .commit(db.as_ref(), event, reslug.then_some(&base), write)
                .await
            {
                Err(StoreError::ConcurrentUpdate(_)) if attempt < self.commit_attempts => {
                    tracing::warn!(event_id = %id, attempt, "event changed since read, merging again");
                    attempt += 1;
                }
                result => {
                    let event = result?;
                    tracing::info!(event_id = %event.id, slug = %event.slug, reslugged = reslug, "event updated");
                    return Ok(event);
                }
            }
        }
    }

    /// Looks up an event by slug.
    ///
    /// # Errors
    ///
    /// Returns connection or store errors; a miss is `Ok(None)`.
    pub async fn find_by_slug(&self, slug: &Slug) -> Result<Option<Event>, StoreError> {
        let db = self.connections.acquire().await?;
        db.find_event_by_slug(slug).await
    }

    /// Looks up an event by identity.
    ///
    /// # Errors
    ///
    /// Returns connection or store errors; a miss is `Ok(None)`.
    pub async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        let db = self.connections.acquire().await?;
        db.find_event_by_id(id).await
    }

    /// Streams every event in `order`. Each call starts a fresh listing.
    ///
    /// # Errors
    ///
    /// Returns connection errors; row errors arrive through the stream.
    pub async fn list_all(&self, order: SortOrder) -> Result<EventStream, StoreError> {
        let db = self.connections.acquire().await?;
        Ok(db.list_events(order))
    }

    /// Returns the other events sharing at least one tag with the event at
    /// `slug`, newest first. An unknown slug yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns connection or store errors.
    pub async fn find_similar_by_slug(&self, slug: &Slug) -> Result<Vec<Event>, StoreError> {
        let db = self.connections.acquire().await?;
        let Some(source) = db.find_event_by_slug(slug).await? else {
            return Ok(Vec::new());
        };
        db.events_sharing_tags(&source.details.tags, source.id).await
    }

    /// Writes `event`, allocating its slug from `base` first when given.
    async fn commit(
        &self,
        db: &dyn Database,
        mut event: Event,
        base: Option<&Slug>,
        write: Write,
    ) -> Result<Event, StoreError> {
        let mut attempt: u32 = 1;
        loop {
            if let Some(base) = base {
                event.slug = self.allocator.allocate(db, base, event.id).await?;
            }
            let result = match write {
                Write::Insert => db.insert_event(&event).await,
                Write::Update(expected) => match db.update_event(&event, expected).await {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(StoreError::ConcurrentUpdate(event.id)),
                    Err(err) => Err(err),
                },
            };
            match result {
                Ok(()) => return Ok(event),
                Err(StoreError::DuplicateSlug(taken))
                    if base.is_some() && attempt < self.commit_attempts =>
                {
                    tracing::warn!(event_id = %event.id, slug = %taken, attempt, "slug claimed concurrently, reallocating");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
