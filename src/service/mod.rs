//! Service layer: entity lifecycles over the shared database handle.
//!
//! [`EventStore`] and [`BookingStore`] validate input, consult the
//! [`SlugAllocator`] and commit through the handle obtained from
//! [`crate::persistence::ConnectionManager`].

pub mod booking_store;
pub mod event_store;
pub mod slug_allocator;

pub use booking_store::BookingStore;
pub use event_store::EventStore;
pub use slug_allocator::SlugAllocator;
