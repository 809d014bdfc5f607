//! Token bucket state for a single rate-limited client.

use chrono::{DateTime, Utc};

/// Slack for floating point drift when comparing token balances.
const TOKEN_EPSILON: f64 = 1e-9;

/// A continuously refilling token bucket.
///
/// Tokens accumulate at `refill_per_sec` up to `capacity`; each admitted request
/// consumes one. Buckets start full.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: DateTime<Utc>,
}

impl TokenBucket {
    pub fn new(capacity: u32, refill_per_sec: f64, now: DateTime<Utc>) -> Self {
        let capacity = f64::from(capacity);
        Self {
            capacity,
            tokens: capacity,
            refill_per_sec: refill_per_sec.max(0.0),
            last_refill: now,
        }
    }

    /// Applies new limits, keeping the current balance clamped to the new capacity.
    pub fn set_limits(&mut self, capacity: u32, refill_per_sec: f64) {
        self.capacity = f64::from(capacity);
        self.refill_per_sec = refill_per_sec.max(0.0);
        self.tokens = self.tokens.min(self.capacity);
    }

    /// Adds the tokens earned since the last refill.
    ///
    /// A clock that moved backwards earns nothing.
    pub fn refill(&mut self, now: DateTime<Utc>) {
        if now <= self.last_refill {
            return;
        }

        let elapsed = now - self.last_refill;
        let elapsed_secs = elapsed
            .num_nanoseconds()
            .map(|n| n as f64 / 1_000_000_000.0)
            .unwrap_or_else(|| elapsed.num_seconds() as f64);

        self.tokens = (self.tokens + elapsed_secs * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    /// Refills and then consumes one token if available.
    pub fn try_consume(&mut self, now: DateTime<Utc>) -> bool {
        self.refill(now);

        if self.tokens + TOKEN_EPSILON >= 1.0 {
            self.tokens = (self.tokens - 1.0).max(0.0);
            true
        } else {
            false
        }
    }

    /// Current balance, rounded down to whole tokens.
    pub fn available(&self) -> u32 {
        (self.tokens + TOKEN_EPSILON).floor() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_bucket_starts_full() {
        let bucket = TokenBucket::new(5, 1.0, Utc::now());
        assert_eq!(bucket.available(), 5);
    }

    #[test]
    fn test_bucket_rejects_after_capacity() {
        let now = Utc::now();
        let mut bucket = TokenBucket::new(3, 1.0, now);

        assert!(bucket.try_consume(now));
        assert!(bucket.try_consume(now));
        assert!(bucket.try_consume(now));
        assert!(!bucket.try_consume(now));
    }

    #[test]
    fn test_bucket_refills_one_token_per_interval() {
        let now = Utc::now();
        let mut bucket = TokenBucket::new(2, 4.0, now);

        assert!(bucket.try_consume(now));
        assert!(bucket.try_consume(now));
        assert!(!bucket.try_consume(now));

        let later = now + Duration::milliseconds(250);
        assert!(bucket.try_consume(later));
        assert!(!bucket.try_consume(later));
    }

    #[test]
    fn test_bucket_never_exceeds_capacity() {
        let now = Utc::now();
        let mut bucket = TokenBucket::new(2, 10.0, now);

        bucket.refill(now + Duration::hours(1));
        assert_eq!(bucket.available(), 2);
    }

    #[test]
    fn test_bucket_ignores_clock_going_backwards() {
        let now = Utc::now();
        let mut bucket = TokenBucket::new(1, 1.0, now);

        assert!(bucket.try_consume(now));
        assert!(!bucket.try_consume(now - Duration::seconds(30)));
    }

    #[test]
    fn test_set_limits_clamps_balance() {
        let now = Utc::now();
        let mut bucket = TokenBucket::new(10, 1.0, now);

        bucket.set_limits(3, 1.0);
        assert_eq!(bucket.available(), 3);
    }
}
