//! Collision-free slug assignment.

use crate::config::{SlugFallback, SlugPolicy};
use crate::domain::{EventId, Slug};
use crate::error::StoreError;
use crate::persistence::Database;

/// Derives a slug not held by any other event.
///
/// Candidates are `base`, `base-2`, `base-3`, ... up to
/// [`SlugPolicy::max_collisions`]. Past that bound the configured
/// [`SlugFallback`] decides. The result is only unique at the moment it is
/// checked; the store's uniqueness constraint has the final word at commit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlugAllocator {
    policy: SlugPolicy,
}

impl SlugAllocator {
    /// Creates an allocator with the given policy.
    #[must_use]
    pub fn new(policy: SlugPolicy) -> Self {
        Self { policy }
    }

    /// Returns the first candidate for `base` that no event other than
    /// `owner` currently holds.
    ///
    /// # Errors
    ///
    /// - [`StoreError::DuplicateSlug`] when every numbered candidate is taken
    ///   and the fallback is [`SlugFallback::Reject`]
    /// - any error from the store lookup
    pub async fn allocate(
        &self,
        db: &dyn Database,
        base: &Slug,
        owner: EventId,
    ) -> Result<Slug, StoreError> {
        let mut candidate = base.clone();
        let mut attempt: u32 = 1;

        while db.slug_taken(&candidate, owner).await? {
            tracing::debug!(slug = %candidate, attempt, "slug collision");
            attempt += 1;
            if attempt > self.policy.max_collisions {
                return match self.policy.fallback {
                    SlugFallback::AppendId => {
                        let fallback = base.with_identity(owner);
                        tracing::warn!(base = %base, slug = %fallback, "slug candidates exhausted, using identity");
                        Ok(fallback)
                    }
                    SlugFallback::Reject => Err(StoreError::DuplicateSlug(base.to_string())),
                };
            }
            candidate = base.with_counter(attempt);
        }

        Ok(candidate)
    }
}
