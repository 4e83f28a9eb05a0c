//! Process-wide connection lifecycle.
//!
//! [`ConnectionManager`] hands out the single shared [`Database`] handle.
//! The first [`acquire`](ConnectionManager::acquire) starts a connection
//! attempt; callers arriving while it is in flight await the same attempt
//! instead of opening their own. A failed attempt is reported to every
//! caller that awaited it and then forgotten, so the next call starts over.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::Mutex;

use super::{Database, MemoryConnector, PgConnector};
use crate::config::DatabaseConfig;
use crate::error::StoreError;

/// Name of the environment variable holding the connection target.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Opens physical connections to a backing store.
#[async_trait]
pub trait Connector: Send + Sync + std::fmt::Debug {
    /// Establishes a new handle to the store at `target`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConnectionFailure`] when the store cannot be
    /// reached.
    async fn connect(&self, target: &str) -> Result<Arc<dyn Database>, StoreError>;
}

/// Picks a connector for the configured target.
///
/// `memory://` targets get an in-process store; everything else is
/// treated as a PostgreSQL URL.
#[must_use]
pub fn connector_for(config: &DatabaseConfig) -> Arc<dyn Connector> {
    match config.url.as_deref() {
        Some(url) if url.starts_with("memory://") => Arc::new(MemoryConnector::new()),
        _ => Arc::new(PgConnector::new(config.clone())),
    }
}

type Attempt = Shared<BoxFuture<'static, Result<Arc<dyn Database>, StoreError>>>;

#[derive(Default)]
struct Slot {
    handle: Option<Arc<dyn Database>>,
    in_flight: Option<(u64, Attempt)>,
    generation: u64,
}

/// Owner of the shared database handle.
///
/// Inject one instance (behind an `Arc`) into every store. The connection
/// target is captured at construction; its absence is only reported when
/// a handle is first requested.
pub struct ConnectionManager {
    target: Option<String>,
    connector: Arc<dyn Connector>,
    slot: Mutex<Slot>,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("has_target", &self.target.is_some())
            .field("connector", &self.connector)
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    /// Creates a manager for `target` using `connector`. No I/O happens here.
    #[must_use]
    pub fn new(target: Option<String>, connector: Arc<dyn Connector>) -> Self {
        Self {
            target,
            connector,
            slot: Mutex::new(Slot::default()),
        }
    }

    /// Creates a manager from database configuration, choosing the
    /// connector with [`connector_for`].
    #[must_use]
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new(config.url.clone(), connector_for(config))
    }

    /// Returns the shared handle, connecting first if needed.
    ///
    /// Once established, the same handle is returned with no I/O.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ConfigurationMissing`] when no target was configured
    /// - [`StoreError::ConnectionFailure`] when the attempt this call
    ///   awaited failed; a later call starts a fresh attempt
    pub async fn acquire(&self) -> Result<Arc<dyn Database>, StoreError> {
        let (generation, attempt) = {
            let mut slot = self.slot.lock().await;
            if let Some(handle) = &slot.handle {
                return Ok(Arc::clone(handle));
            }
            if let Some((generation, attempt)) = slot.in_flight.clone() {
                tracing::debug!(generation, "joining in-flight connection attempt");
                (generation, attempt)
            } else {
                let target = self
                    .target
                    .clone()
                    .ok_or(StoreError::ConfigurationMissing(DATABASE_URL_VAR))?;
                let connector = Arc::clone(&self.connector);
                let attempt = async move { connector.connect(&target).await }
                    .boxed()
                    .shared();
                let generation = slot.generation.wrapping_add(1);
                slot.generation = generation;
                slot.in_flight = Some((generation, attempt.clone()));
                tracing::debug!(generation, "starting connection attempt");
                (generation, attempt)
            }
        };

        let result = attempt.await;

        let mut slot = self.slot.lock().await;
        if slot.in_flight.as_ref().is_some_and(|(g, _)| *g == generation) {
            slot.in_flight = None;
            match &result {
                Ok(handle) => {
                    tracing::info!(generation, "database connection established");
                    slot.handle = Some(Arc::clone(handle));
                }
                Err(err) => {
                    tracing::warn!(generation, error = %err, "database connection attempt failed");
                }
            }
        }
        result
    }

    /// Returns `true` once a handle has been established.
    pub async fn is_connected(&self) -> bool {
        self.slot.lock().await.handle.is_some()
    }
}
