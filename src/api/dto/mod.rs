//! Data Transfer Objects for REST request/response serialization.
//!
//! Domain records serialize as-is; these types only add envelopes and
//! query parameters.

pub mod booking_dto;
pub mod event_dto;

pub use booking_dto::*;
pub use event_dto::*;
