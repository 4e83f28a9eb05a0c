//! Event records and the raw field sets they are built from.
//!
//! [`NewEvent`] carries caller input exactly as received. [`NewEvent::validate`]
//! is the single validation pass: it trims and checks every required field,
//! normalizes the collections, derives the base slug and canonicalizes the
//! date and time. Only its output ([`EventDetails`]) is ever persisted.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

use super::normalize::{normalize_date, normalize_string_list, normalize_time, required};
use super::slug::slugify;
use super::{EventId, Slug};
use crate::error::StoreError;

/// Calendar date of an event, canonically `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, format = Date, example = "2025-03-05")]
pub struct EventDate(NaiveDate);

impl EventDate {
    /// Returns the inner [`NaiveDate`].
    #[must_use]
    pub const fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for EventDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for EventDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Start time of an event, canonically 24-hour `HH:mm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema)]
#[schema(value_type = String, example = "18:30")]
pub struct EventTime(NaiveTime);

impl EventTime {
    /// Returns the inner [`NaiveTime`] (seconds always zero).
    #[must_use]
    pub const fn as_naive(&self) -> NaiveTime {
        self.0
    }
}

impl From<NaiveTime> for EventTime {
    fn from(time: NaiveTime) -> Self {
        Self(time)
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for EventTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EventTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        normalize_time(&raw).map_err(serde::de::Error::custom)
    }
}

/// Raw event fields as supplied by a caller.
///
/// Missing fields deserialize as empty so that validation reports the
/// offending field by name instead of failing on shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct NewEvent {
    /// Event title; the slug is derived from it.
    pub title: String,
    /// Long description.
    pub description: String,
    /// Short overview.
    pub overview: String,
    /// Hosted image URL (already uploaded).
    pub image: String,
    /// Venue name.
    pub venue: String,
    /// City / address.
    pub location: String,
    /// Date expression, canonicalized to `YYYY-MM-DD`.
    pub date: String,
    /// Time expression, canonicalized to `HH:mm`.
    pub time: String,
    /// Attendance mode (e.g. `"online"`, `"hybrid"`).
    pub mode: String,
    /// Intended audience.
    pub audience: String,
    /// Ordered agenda items.
    pub agenda: Vec<String>,
    /// Organizer description.
    pub organizer: String,
    /// Tags used for similarity matching.
    pub tags: Vec<String>,
}

impl NewEvent {
    /// Validates and canonicalizes every field.
    ///
    /// Checks run in a fixed order: required strings, then collections,
    /// then the title's slug, then date and time.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ValidationFailed`] naming the first empty field
    /// - [`StoreError::EmptyCollection`] for `agenda` or `tags`
    /// - [`StoreError::EmptySlug`] when the title has no usable characters
    /// - [`StoreError::InvalidDate`] / [`StoreError::InvalidTime`]
    pub fn validate(&self) -> Result<(EventDetails, Slug), StoreError> {
        let title = required("title", &self.title)?;
        let description = required("description", &self.description)?;
        let overview = required("overview", &self.overview)?;
        let image = required("image", &self.image)?;
        let venue = required("venue", &self.venue)?;
        let location = required("location", &self.location)?;
        required("date", &self.date)?;
        required("time", &self.time)?;
        let mode = required("mode", &self.mode)?;
        let audience = required("audience", &self.audience)?;
        let organizer = required("organizer", &self.organizer)?;

        let agenda = normalize_string_list(&self.agenda);
        if agenda.is_empty() {
            return Err(StoreError::EmptyCollection("agenda"));
        }
        let tags = normalize_string_list(&self.tags);
        if tags.is_empty() {
            return Err(StoreError::EmptyCollection("tags"));
        }

        let base_slug = slugify(&title)?;
        let date = normalize_date(&self.date)?;
        let time = normalize_time(&self.time)?;

        Ok((
            EventDetails {
                title,
                description,
                overview,
                image,
                venue,
                location,
                date,
                time,
                mode,
                audience,
                agenda,
                organizer,
                tags,
            },
            base_slug,
        ))
    }
}

impl From<&EventDetails> for NewEvent {
    fn from(details: &EventDetails) -> Self {
        Self {
            title: details.title.clone(),
            description: details.description.clone(),
            overview: details.overview.clone(),
            image: details.image.clone(),
            venue: details.venue.clone(),
            location: details.location.clone(),
            date: details.date.to_string(),
            time: details.time.to_string(),
            mode: details.mode.clone(),
            audience: details.audience.clone(),
            agenda: details.agenda.clone(),
            organizer: details.organizer.clone(),
            tags: details.tags.clone(),
        }
    }
}

/// Partial change to an existing event. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct EventUpdate {
    /// New title; triggers re-slugging when it differs.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New overview.
    pub overview: Option<String>,
    /// New image URL.
    pub image: Option<String>,
    /// New venue.
    pub venue: Option<String>,
    /// New location.
    pub location: Option<String>,
    /// New date expression.
    pub date: Option<String>,
    /// New time expression.
    pub time: Option<String>,
    /// New mode.
    pub mode: Option<String>,
    /// New audience.
    pub audience: Option<String>,
    /// Replacement agenda.
    pub agenda: Option<Vec<String>>,
    /// New organizer.
    pub organizer: Option<String>,
    /// Replacement tags.
    pub tags: Option<Vec<String>>,
}

impl EventUpdate {
    /// Overlays this patch on the current details, producing a raw field
    /// set that must be validated again.
    #[must_use]
    pub fn apply_to(&self, current: &EventDetails) -> NewEvent {
        let mut raw = NewEvent::from(current);
        let overlay = |field: &mut String, value: &Option<String>| {
            if let Some(v) = value {
                field.clone_from(v);
            }
        };
        overlay(&mut raw.title, &self.title);
        overlay(&mut raw.description, &self.description);
        overlay(&mut raw.overview, &self.overview);
        overlay(&mut raw.image, &self.image);
        overlay(&mut raw.venue, &self.venue);
        overlay(&mut raw.location, &self.location);
        overlay(&mut raw.date, &self.date);
        overlay(&mut raw.time, &self.time);
        overlay(&mut raw.mode, &self.mode);
        overlay(&mut raw.audience, &self.audience);
        overlay(&mut raw.organizer, &self.organizer);
        if let Some(agenda) = &self.agenda {
            raw.agenda.clone_from(agenda);
        }
        if let Some(tags) = &self.tags {
            raw.tags.clone_from(tags);
        }
        raw
    }
}

/// Validated, canonical content of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventDetails {
    /// Trimmed title.
    pub title: String,
    /// Trimmed description.
    pub description: String,
    /// Trimmed overview.
    pub overview: String,
    /// Hosted image URL.
    pub image: String,
    /// Venue name.
    pub venue: String,
    /// City / address.
    pub location: String,
    /// Canonical date.
    pub date: EventDate,
    /// Canonical time.
    pub time: EventTime,
    /// Attendance mode.
    pub mode: String,
    /// Intended audience.
    pub audience: String,
    /// Agenda items, at least one.
    pub agenda: Vec<String>,
    /// Organizer description.
    pub organizer: String,
    /// Tags, at least one.
    pub tags: Vec<String>,
}

/// A persisted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Event {
    /// Server-assigned identity.
    pub id: EventId,
    /// Unique slug, assigned at write time.
    pub slug: Slug,
    /// Canonical content.
    #[serde(flatten)]
    pub details: EventDetails,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last modification instant, never earlier than `created_at`.
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Returns `true` when the two events share at least one tag.
    #[must_use]
    pub fn shares_tag_with(&self, tags: &[String]) -> bool {
        self.details.tags.iter().any(|t| tags.contains(t))
    }
}

/// Ordering of [`crate::service::EventStore::list_all`] by creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Most recently created first.
    #[default]
    NewestFirst,
    /// Oldest first.
    OldestFirst,
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample(title: &str) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: "A day of talks and workshops.".to_string(),
            overview: "Talks and workshops".to_string(),
            image: "https://cdn.example.com/devevent/cover.png".to_string(),
            venue: "Main Hall".to_string(),
            location: "Berlin, Germany".to_string(),
            date: "2025-3-5".to_string(),
            time: "6:30 pm".to_string(),
            mode: "hybrid".to_string(),
            audience: "Developers".to_string(),
            agenda: vec![" Keynote ".to_string(), String::new(), "Panel".to_string()],
            organizer: "Rust Berlin".to_string(),
            tags: vec!["rust".to_string(), "  ".to_string(), "systems".to_string()],
        }
    }

    #[test]
    fn validate_canonicalizes_fields() {
        let Ok((details, slug)) = sample("  Rust Summit ").validate() else {
            panic!("sample should validate");
        };
        assert_eq!(details.title, "Rust Summit");
        assert_eq!(details.date.to_string(), "2025-03-05");
        assert_eq!(details.time.to_string(), "18:30");
        assert_eq!(details.agenda, vec!["Keynote", "Panel"]);
        assert_eq!(details.tags, vec!["rust", "systems"]);
        assert_eq!(slug.as_str(), "rust-summit");
    }

    #[test]
    fn validate_names_the_first_empty_field() {
        let mut raw = sample("Rust Summit");
        raw.venue = "   ".to_string();
        raw.mode = String::new();
        let Err(err) = raw.validate() else {
            panic!("expected validation failure");
        };
        assert_eq!(err, StoreError::empty_field("venue"));
    }

    #[test]
    fn validate_rejects_blank_collections() {
        let mut raw = sample("Rust Summit");
        raw.tags = vec![" ".to_string(), String::new()];
        assert_eq!(raw.validate(), Err(StoreError::EmptyCollection("tags")));

        let mut raw = sample("Rust Summit");
        raw.agenda = Vec::new();
        assert_eq!(raw.validate(), Err(StoreError::EmptyCollection("agenda")));
    }

    #[test]
    fn validate_reports_unusable_titles_before_dates() {
        let mut raw = sample("???");
        raw.date = "2024-02-30".to_string();
        assert!(matches!(raw.validate(), Err(StoreError::EmptySlug(_))));
    }

    #[test]
    fn validate_rejects_bad_date_and_time() {
        let mut raw = sample("Rust Summit");
        raw.date = "2024-02-30".to_string();
        assert!(matches!(raw.validate(), Err(StoreError::InvalidDate(_))));

        let mut raw = sample("Rust Summit");
        raw.time = "25:00".to_string();
        assert!(matches!(raw.validate(), Err(StoreError::InvalidTime(_))));
    }

    #[test]
    fn update_overlays_only_given_fields() {
        let Ok((details, _)) = sample("Rust Summit").validate() else {
            panic!("sample should validate");
        };
        let patch = EventUpdate {
            venue: Some("Annex".to_string()),
            tags: Some(vec!["wasm".to_string()]),
            ..EventUpdate::default()
        };
        let raw = patch.apply_to(&details);
        assert_eq!(raw.venue, "Annex");
        assert_eq!(raw.title, "Rust Summit");
        assert_eq!(raw.date, "2025-03-05");
        assert_eq!(raw.tags, vec!["wasm"]);
    }

    #[test]
    fn event_time_serializes_as_hh_mm() {
        let Ok(time) = normalize_time("9:05 am") else {
            panic!("valid time");
        };
        let Ok(json) = serde_json::to_string(&time) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"09:05\"");
    }
}
