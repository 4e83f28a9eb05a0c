//! PostgreSQL implementation of the persistence layer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::models::{BookingRow, EventRow};
use super::{Connector, Database, EventStream};
use crate::config::DatabaseConfig;
use crate::domain::{Booking, Event, EventId, Slug, SortOrder};
use crate::error::StoreError;

macro_rules! select_events {
    ($tail:literal) => {
        concat!(
            "SELECT id, slug, title, description, overview, image, venue, location, \
             date, time, mode, audience, agenda, organizer, tags, created_at, updated_at \
             FROM events ",
            $tail
        )
    };
}

/// Maps a write error, recognizing the slug index and the event foreign key.
///
/// Primary keys are random v4 UUIDs, so the only unique violation a write
/// can realistically hit is on `events_slug_key`.
fn map_write_error(err: sqlx::Error, slug: Option<&Slug>, event_id: EventId) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::DuplicateSlug(slug.map(ToString::to_string).unwrap_or_default());
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::EventNotFound(event_id);
        }
    }
    StoreError::from(err)
}

/// Opens `sqlx` connection pools to PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgConnector {
    config: DatabaseConfig,
}

impl PgConnector {
    /// Creates a connector using the pool settings in `config`.
    #[must_use]
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self, target: &str) -> Result<Arc<dyn Database>, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .min_connections(self.config.min_connections)
            .acquire_timeout(Duration::from_secs(self.config.connect_timeout_secs))
            .connect(target)
            .await
            .map_err(|e| StoreError::ConnectionFailure(e.to_string()))?;

        if self.config.run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| StoreError::ConnectionFailure(format!("migration failed: {e}")))?;
        }

        Ok(Arc::new(PgDatabase::new(pool)))
    }
}

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    /// Wraps an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn slug_taken(&self, slug: &Slug, excluding: EventId) -> Result<bool, StoreError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM events WHERE slug = $1 AND id <> $2)",
        )
        .bind(slug.as_str())
        .bind(excluding.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn insert_event(&self, event: &Event) -> Result<(), StoreError> {
        let d = &event.details;
        sqlx::query(
            "INSERT INTO events (id, slug, title, description, overview, image, venue, location, \
             date, time, mode, audience, agenda, organizer, tags, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(event.id.as_uuid())
        .bind(event.slug.as_str())
        .bind(&d.title)
        .bind(&d.description)
        .bind(&d.overview)
        .bind(&d.image)
        .bind(&d.venue)
        .bind(&d.location)
        .bind(d.date.as_naive())
        .bind(d.time.as_naive())
        .bind(&d.mode)
        .bind(&d.audience)
        .bind(&d.agenda)
        .bind(&d.organizer)
        .bind(&d.tags)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, Some(&event.slug), event.id))?;
        Ok(())
    }

    async fn update_event(
        &self,
        event: &Event,
        expected: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let d = &event.details;
        let result = sqlx::query(
            "UPDATE events SET slug = $2, title = $3, description = $4, overview = $5, \
             image = $6, venue = $7, location = $8, date = $9, time = $10, mode = $11, \
             audience = $12, agenda = $13, organizer = $14, tags = $15, updated_at = $16 \
             WHERE id = $1 AND updated_at = $17",
        )
        .bind(event.id.as_uuid())
        .bind(event.slug.as_str())
        .bind(&d.title)
        .bind(&d.description)
        .bind(&d.overview)
        .bind(&d.image)
        .bind(&d.venue)
        .bind(&d.location)
        .bind(d.date.as_naive())
        .bind(d.time.as_naive())
        .bind(&d.mode)
        .bind(&d.audience)
        .bind(&d.agenda)
        .bind(&d.organizer)
        .bind(&d.tags)
        .bind(event.updated_at)
        .bind(expected)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, Some(&event.slug), event.id))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        if self.event_exists(event.id).await? {
            Ok(false)
        } else {
            Err(StoreError::EventNotFound(event.id))
        }
    }

    async fn find_event_by_slug(&self, slug: &Slug) -> Result<Option<Event>, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(select_events!("WHERE slug = $1"))
            .bind(slug.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Event::from))
    }

    async fn find_event_by_id(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(select_events!("WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Event::from))
    }

    async fn event_exists(&self, id: EventId) -> Result<bool, StoreError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM events WHERE id = $1)")
                .bind(id.as_uuid())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    fn list_events(&self, order: SortOrder) -> EventStream {
        let pool = self.pool.clone();
        let sql = match order {
            SortOrder::NewestFirst => select_events!("ORDER BY created_at DESC, id"),
            SortOrder::OldestFirst => select_events!("ORDER BY created_at ASC, id"),
        };
        Box::pin(async_stream::stream! {
            let mut rows = sqlx::query_as::<_, EventRow>(sql).fetch(&pool);
            while let Some(row) = rows.next().await {
                yield row.map(Event::from).map_err(StoreError::from);
            }
        })
    }

    async fn events_sharing_tags(
        &self,
        tags: &[String],
        excluding: EventId,
    ) -> Result<Vec<Event>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(select_events!(
            "WHERE id <> $1 AND tags && $2 ORDER BY created_at DESC"
        ))
        .bind(excluding.as_uuid())
        .bind(tags)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO bookings (id, event_id, email, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(booking.id.as_uuid())
        .bind(booking.event_id.as_uuid())
        .bind(booking.email.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, None, booking.event_id))?;
        Ok(())
    }

    async fn bookings_for_event(&self, event_id: EventId) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            "SELECT id, event_id, email, created_at, updated_at FROM bookings \
             WHERE event_id = $1 ORDER BY created_at ASC",
        )
        .bind(event_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn count_bookings_for_event(&self, event_id: EventId) -> Result<u64, StoreError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE event_id = $1")
                .bind(event_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::event::tests::sample;

    // Run with: DATABASE_URL=postgres://... cargo test -- --ignored

    async fn connect() -> Arc<dyn Database> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            panic!("DATABASE_URL required");
        };
        let connector = PgConnector::new(DatabaseConfig {
            url: Some(url.clone()),
            ..DatabaseConfig::default()
        });
        let Ok(db) = connector.connect(&url).await else {
            panic!("connection failed");
        };
        db
    }

    fn event(title: &str) -> Event {
        let Ok((details, slug)) = sample(title).validate() else {
            panic!("sample should validate");
        };
        let now = crate::domain::stored_now();
        let id = EventId::new();
        Event {
            id,
            slug: slug.with_identity(id),
            details,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn unique_index_rejects_duplicate_slug() {
        let db = connect().await;
        let first = event("Pg Dup");
        let mut second = event("Pg Dup");
        second.slug = first.slug.clone();

        assert!(db.insert_event(&first).await.is_ok());
        assert_eq!(
            db.insert_event(&second).await,
            Err(StoreError::DuplicateSlug(first.slug.to_string()))
        );
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn update_with_stale_timestamp_writes_nothing() {
        let db = connect().await;
        let first = event("Pg Stale");
        assert!(db.insert_event(&first).await.is_ok());

        let mut moved = first.clone();
        moved.updated_at = first.updated_at + chrono::TimeDelta::seconds(1);
        assert_eq!(db.update_event(&moved, first.updated_at).await, Ok(true));

        let mut stale = first.clone();
        stale.details.venue = "Elsewhere".to_string();
        assert_eq!(db.update_event(&stale, first.updated_at).await, Ok(false));
        let Ok(Some(stored)) = db.find_event_by_id(first.id).await else {
            panic!("event should exist");
        };
        assert_eq!(stored, moved);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn dangling_booking_is_rejected_by_foreign_key() {
        let db = connect().await;
        let Ok(email) = crate::domain::normalize::normalize_email("a@b.com") else {
            panic!("valid email");
        };
        let booking = Booking::new(EventId::new(), email);
        assert_eq!(
            db.insert_booking(&booking).await,
            Err(StoreError::EventNotFound(booking.event_id))
        );
    }
}
