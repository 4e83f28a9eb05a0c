//! URL-safe, human-readable event identifiers.
//!
//! A [`Slug`] is a lowercase, hyphen-separated token sequence matching
//! `^[a-z0-9]+(-[a-z0-9]+)*$`, at most [`MAX_SLUG_LEN`] characters long.
//! It can only be built by [`slugify`], by suffixing an existing slug, or
//! by parsing caller input with [`Slug::parse`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::EventId;
use crate::error::StoreError;

/// Longest slug accepted on routes.
pub const MAX_SLUG_LEN: usize = 200;

/// Longest base produced by [`slugify`]. Leaves room for a `-<n>` suffix
/// or a `-<uuid>` fallback within [`MAX_SLUG_LEN`].
pub const MAX_BASE_LEN: usize = 160;

#[allow(clippy::expect_used)]
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("literal pattern"));

#[allow(clippy::expect_used)]
static NON_ALNUM_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("literal pattern"));

/// Unique, URL-safe identifier derived from an event title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "dev-conf-2")]
pub struct Slug(String);

impl Slug {
    /// Parses a slug received from a caller (e.g. a route parameter).
    ///
    /// Input is trimmed and folded to lowercase before validation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidSlug`] when the value is empty, longer
    /// than [`MAX_SLUG_LEN`], or not a hyphen-separated alphanumeric sequence.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(StoreError::InvalidSlug("must be a non-empty string".to_string()));
        }
        if normalized.len() > MAX_SLUG_LEN {
            return Err(StoreError::InvalidSlug(format!(
                "longer than {MAX_SLUG_LEN} characters"
            )));
        }
        if !SLUG_RE.is_match(&normalized) {
            return Err(StoreError::InvalidSlug(
                "use lowercase letters, numbers, and hyphens only".to_string(),
            ));
        }
        Ok(Self(normalized))
    }

    /// Returns `base-n`, the `n`-th collision candidate.
    #[must_use]
    pub fn with_counter(&self, n: u32) -> Self {
        Self(format!("{}-{n}", self.0))
    }

    /// Returns `base-<id>`, unique because record identities are unique.
    #[must_use]
    pub fn with_identity(&self, id: EventId) -> Self {
        Self(format!("{}-{id}", self.0))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rebuilds a slug read back from the store without re-validating it.
    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derives the base slug for a title.
///
/// Lowercases, strips quote characters, collapses every run of
/// non-alphanumeric characters into one hyphen and trims hyphens from both
/// ends. Bases longer than [`MAX_BASE_LEN`] are cut back to the last whole
/// token that fits.
///
/// # Errors
///
/// Returns [`StoreError::EmptySlug`] when nothing alphanumeric remains.
pub fn slugify(title: &str) -> Result<Slug, StoreError> {
    let lowered = title.trim().to_lowercase().replace(['"', '\''], "");
    let hyphenated = NON_ALNUM_RUN_RE.replace_all(&lowered, "-");
    let mut slug = hyphenated.trim_matches('-').to_string();

    if slug.len() > MAX_BASE_LEN {
        let at_boundary = slug.as_bytes().get(MAX_BASE_LEN) == Some(&b'-');
        let keep = match slug.get(..MAX_BASE_LEN) {
            Some(head) if !at_boundary => head.rfind('-').unwrap_or(MAX_BASE_LEN),
            _ => MAX_BASE_LEN,
        };
        slug.truncate(keep);
        let trimmed = slug.trim_end_matches('-').len();
        slug.truncate(trimmed);
    }

    if slug.is_empty() {
        return Err(StoreError::EmptySlug(title.to_string()));
    }
    Ok(Slug(slug))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn slug_of(title: &str) -> String {
        let Ok(slug) = slugify(title) else {
            panic!("expected a slug for {title:?}");
        };
        slug.to_string()
    }

    #[test]
    fn slugify_collapses_punctuation_and_whitespace() {
        assert_eq!(slug_of("  Hello, World!! "), "hello-world");
        assert_eq!(slug_of("Dev Conf!!"), "dev-conf");
        assert_eq!(slug_of("Dev Conf??"), "dev-conf");
        assert_eq!(slug_of("Rust -- Meetup 2025"), "rust-meetup-2025");
    }

    #[test]
    fn slugify_strips_quotes_without_splitting() {
        assert_eq!(slug_of("Don't Panic"), "dont-panic");
        assert_eq!(slug_of("The \"Big\" Summit"), "the-big-summit");
    }

    #[test]
    fn slugify_rejects_punctuation_only_titles() {
        assert!(matches!(slugify("???"), Err(StoreError::EmptySlug(_))));
        assert!(matches!(slugify("   "), Err(StoreError::EmptySlug(_))));
    }

    #[test]
    fn slugify_treats_non_ascii_letters_as_separators() {
        assert_eq!(slug_of("Café Conf"), "caf-conf");
    }

    #[test]
    fn slugify_caps_long_titles_at_a_token_boundary() {
        let title = "word ".repeat(60);
        let slug = slug_of(&title);
        assert!(slug.len() <= MAX_BASE_LEN);
        assert!(!slug.ends_with('-'));
        assert!(Slug::parse(&slug).is_ok());
    }

    #[test]
    fn parse_folds_case_and_trims() {
        let Ok(slug) = Slug::parse("  Dev-Conf-2 ") else {
            panic!("expected valid slug");
        };
        assert_eq!(slug.as_str(), "dev-conf-2");
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for raw in ["", "dev--conf", "-dev", "dev conf", "dév", "dev_conf"] {
            assert!(
                matches!(Slug::parse(raw), Err(StoreError::InvalidSlug(_))),
                "{raw:?} should be rejected"
            );
        }
        let too_long = "a".repeat(MAX_SLUG_LEN + 1);
        assert!(Slug::parse(&too_long).is_err());
    }

    #[test]
    fn suffixed_candidates_stay_valid() {
        let Ok(base) = slugify("Dev Conf") else {
            panic!("expected slug");
        };
        assert_eq!(base.with_counter(2).as_str(), "dev-conf-2");
        let fallback = base.with_identity(EventId::new());
        assert!(Slug::parse(fallback.as_str()).is_ok());
    }
}
