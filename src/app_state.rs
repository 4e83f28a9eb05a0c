//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::persistence::ConnectionManager;
use crate::service::{BookingStore, EventStore};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event lifecycle.
    pub events: Arc<EventStore>,
    /// Booking lifecycle.
    pub bookings: Arc<BookingStore>,
    /// The connection manager both stores draw from.
    pub connections: Arc<ConnectionManager>,
}

impl AppState {
    /// Wires both stores to one connection manager.
    #[must_use]
    pub fn new(connections: Arc<ConnectionManager>, config: &GatewayConfig) -> Self {
        Self {
            events: Arc::new(EventStore::new(Arc::clone(&connections), config.slug)),
            bookings: Arc::new(BookingStore::new(Arc::clone(&connections))),
            connections,
        }
    }
}
