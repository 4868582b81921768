//! Expiration Module
//!
//! Defines the policies deciding when a cache entry stops being valid.

use std::time::{Duration, Instant};

use crate::config::ExpirationConfig;
use crate::error::{CacheError, Result};

/// Deadline used when `now + lifetime` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

// == Expiration ==
/// Expiration policy attached to every cache entry.
///
/// All variants expire the same way: once the current instant reaches the
/// deadline fixed at construction. Tag variants additionally register the
/// entry in the cache's tag index so it can be invalidated in bulk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiration {
    /// Expires a fixed duration after creation
    Fixed { deadline: Instant },
    /// Expires after the configured tag lifetime; indexed under one tag
    Tag { tag: String, deadline: Instant },
    /// Expires after the configured tag lifetime; indexed under every tag
    Tags { tags: Vec<String>, deadline: Instant },
}

impl Expiration {
    // == Constructors ==
    /// Policy expiring `duration` from now.
    pub fn fixed_for(duration: Duration) -> Self {
        Expiration::Fixed {
            deadline: deadline_after(duration),
        }
    }

    /// Policy carrying a single tag and the config's default lifetime.
    pub fn with_tag(config: &ExpirationConfig, tag: impl Into<String>) -> Self {
        Expiration::Tag {
            tag: tag.into(),
            deadline: deadline_after(config.default_lifetime()),
        }
    }

    /// Policy carrying several tags sharing one deadline.
    ///
    /// Duplicate tags are collapsed. A single tag yields the same policy as
    /// [`Expiration::with_tag`].
    ///
    /// # Errors
    /// Returns `CacheError::InvalidArgument` when `tags` is empty.
    pub fn with_tags<I, S>(config: &ExpirationConfig, tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collected: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.into();
            if !collected.contains(&tag) {
                collected.push(tag);
            }
        }

        match collected.len() {
            0 => Err(CacheError::InvalidArgument(
                "with_tags needs at least one tag".to_string(),
            )),
            1 => Ok(Self::with_tag(config, collected.remove(0))),
            _ => Ok(Expiration::Tags {
                tags: collected,
                deadline: deadline_after(config.default_lifetime()),
            }),
        }
    }

    // == Accessors ==
    /// Absolute instant at which the policy expires.
    pub fn deadline(&self) -> Instant {
        match self {
            Expiration::Fixed { deadline }
            | Expiration::Tag { deadline, .. }
            | Expiration::Tags { deadline, .. } => *deadline,
        }
    }

    /// Tags the entry is indexed under. Empty for fixed policies.
    pub fn tags(&self) -> &[String] {
        match self {
            Expiration::Fixed { .. } => &[],
            Expiration::Tag { tag, .. } => std::slice::from_ref(tag),
            Expiration::Tags { tags, .. } => tags,
        }
    }

    // == Is Expired ==
    /// Returns true once `now` is at or after the deadline.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline()
    }

    /// Remaining lifetime at `now`, zero once expired.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline().saturating_duration_since(now)
    }
}

fn deadline_after(lifetime: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(lifetime).unwrap_or(now + FAR_FUTURE)
}
