//! Event request and response bodies.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Event, SortOrder};

/// Listing order accepted on `GET /events`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderParam {
    /// Most recently created first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
}

impl From<OrderParam> for SortOrder {
    fn from(order: OrderParam) -> Self {
        match order {
            OrderParam::Newest => Self::NewestFirst,
            OrderParam::Oldest => Self::OldestFirst,
        }
    }
}

/// Query parameters for listing events.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListEventsParams {
    /// `newest` (default) or `oldest`.
    #[serde(default)]
    pub order: OrderParam,
}

/// Response for `GET /events` and `GET /events/{slug}/similar`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventListResponse {
    /// Matching events.
    pub events: Vec<Event>,
    /// Number of events returned.
    pub count: usize,
}

impl From<Vec<Event>> for EventListResponse {
    fn from(events: Vec<Event>) -> Self {
        Self {
            count: events.len(),
            events,
        }
    }
}
