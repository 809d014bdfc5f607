//! Tiered time-to-live for URL mappings.

use chrono::{DateTime, Duration, Utc};

use crate::domain::entities::Tier;

/// Computes absolute expiry timestamps from a caller's tier.
///
/// A `None` TTL means mappings of that tier never expire. Refreshes always
/// recompute from the supplied `now`, so each reuse extends a mapping's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub anonymous_ttl: Option<Duration>,
    pub authenticated_ttl: Option<Duration>,
    pub premium_ttl: Option<Duration>,
}

impl ExpiryPolicy {
    pub fn ttl_for(&self, tier: Tier) -> Option<Duration> {
        match tier {
            Tier::Anonymous => self.anonymous_ttl,
            Tier::Authenticated => self.authenticated_ttl,
            Tier::Premium => self.premium_ttl,
        }
    }

    pub fn compute_expiry(&self, tier: Tier, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.ttl_for(tier)
            .map(|ttl| now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            anonymous_ttl: Some(Duration::hours(12)),
            authenticated_ttl: Some(Duration::days(7)),
            premium_ttl: Some(Duration::days(90)),
        }
    }
}
