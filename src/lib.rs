//! # devevent-gateway
//!
//! Persistence core and REST gateway for publishing developer events and
//! collecting attendee bookings.
//!
//! Caller input is validated and canonicalized in [`domain`], events get a
//! unique URL-safe slug from [`service::SlugAllocator`], and every write
//! goes through one shared database handle owned by
//! [`persistence::ConnectionManager`].
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── EventStore / BookingStore (service/)
//!     ├── SlugAllocator (service/)
//!     ├── Normalization (domain/)
//!     │
//!     ├── ConnectionManager (persistence/)
//!     │
//!     └── PostgreSQL or in-memory store
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
