//! Keyed token-bucket registry with a background idle sweep.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::clock::Clock;
use crate::domain::entities::TokenBucket;

/// Registry state for one client key.
#[derive(Debug, Clone)]
struct ClientEntry {
    bucket: TokenBucket,
    last_seen: DateTime<Utc>,
}

/// A registry of per-key token buckets.
///
/// # Concurrency
///
/// Entries live in a [`DashMap`]. An admission holds the write lock of the key's
/// shard while it refills, consumes and stamps `last_seen`, so concurrent checks on
/// the same key are serialized and never lose updates. Keys in other shards
/// proceed in parallel.
///
/// [`sweep`](Self::sweep) removes idle entries through `retain`, which takes the
/// same shard locks. An entry can therefore never be evicted while an admission
/// on it is in flight, and an admission that lands right after an eviction simply
/// starts a fresh, full bucket.
///
/// # Lifecycle
///
/// [`start`](Self::start) spawns a periodic sweep owned by the registry;
/// [`shutdown`](Self::shutdown) cancels it. Registries built with
/// [`new`](Self::new) have no background task, which suits isolated tests.
pub struct RateLimiterRegistry {
    name: &'static str,
    entries: DashMap<String, ClientEntry>,
    retention: Duration,
    clock: Arc<dyn Clock>,
    sweeper: Mutex<Option<Sweeper>>,
}

struct Sweeper {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RateLimiterRegistry {
    /// Creates a registry without a background sweep.
    ///
    /// `name` labels logs and metrics; `retention` is how long a key may stay idle
    /// before a sweep reclaims it.
    pub fn new(name: &'static str, retention: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            retention,
            clock,
            sweeper: Mutex::new(None),
        }
    }

    /// Creates a registry and starts its periodic sweep on the current tokio runtime.
    pub fn start(
        name: &'static str,
        retention: Duration,
        sweep_every: std::time::Duration,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        let registry = Arc::new(Self::new(name, retention, clock));
        registry.spawn_sweeper(sweep_every);
        registry
    }

    /// Attempts to admit one request for `key`.
    ///
    /// The bucket is created full on first sight of `key`. Limits passed here are
    /// applied to existing buckets too, so a caller whose tier changes gets the new
    /// limits on their next request.
    pub fn admit(&self, key: &str, capacity: u32, refill_per_sec: f64) -> bool {
        let now = self.clock.now();

        let allowed = match self.entries.get_mut(key) {
            Some(mut entry) => Self::check(&mut entry, capacity, refill_per_sec, now),
            None => {
                let mut entry = self
                    .entries
                    .entry(key.to_owned())
                    .or_insert_with(|| ClientEntry {
                        bucket: TokenBucket::new(capacity, refill_per_sec, now),
                        last_seen: now,
                    });
                Self::check(&mut entry, capacity, refill_per_sec, now)
            }
        };

        if !allowed {
            metrics::counter!("shortlink_admissions_rejected_total", "limiter" => self.name)
                .increment(1);
        }

        allowed
    }

    fn check(entry: &mut ClientEntry, capacity: u32, refill_per_sec: f64, now: DateTime<Utc>) -> bool {
        entry.bucket.set_limits(capacity, refill_per_sec);
        entry.last_seen = entry.last_seen.max(now);
        entry.bucket.try_consume(now)
    }

    /// Removes entries idle for longer than the retention window.
    ///
    /// Returns the number of evicted keys.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();

        self.entries
            .retain(|_, entry| now - entry.last_seen <= self.retention);

        let remaining = self.entries.len();
        let evicted = before.saturating_sub(remaining);

        metrics::gauge!("shortlink_limiter_entries", "limiter" => self.name).set(remaining as f64);
        if evicted > 0 {
            debug!(
                limiter = self.name,
                evicted, remaining, "Swept idle rate limiter entries"
            );
        }

        evicted
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if `key` currently has a bucket.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Whole tokens left for `key`, if tracked. Does not refill.
    pub fn available(&self, key: &str) -> Option<u32> {
        self.entries.get(key).map(|e| e.bucket.available())
    }

    /// Spawns the periodic sweep. Replaces and cancels any previous one.
    ///
    /// The task holds only a weak reference, so it also ends when the registry is
    /// dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: std::time::Duration) {
        let cancel = CancellationToken::new();
        let weak: Weak<Self> = Arc::downgrade(self);
        let token = cancel.clone();
        let name = self.name;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let Some(registry) = weak.upgrade() else { break };
                        registry.sweep();
                    }
                }
            }

            debug!(limiter = name, "Rate limiter sweep stopped");
        });

        let previous = self
            .sweeper
            .lock()
            .ok()
            .and_then(|mut slot| slot.replace(Sweeper { cancel, handle }));
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }

        info!(limiter = name, every_secs = every.as_secs_f64(), "Rate limiter sweep started");
    }

    /// Returns true while a background sweep is running.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .ok()
            .is_some_and(|slot| slot.as_ref().is_some_and(|s| !s.handle.is_finished()))
    }

    /// Stops the background sweep and waits for it to finish.
    pub async fn shutdown(&self) {
        let sweeper = self.sweeper.lock().ok().and_then(|mut slot| slot.take());

        if let Some(sweeper) = sweeper {
            sweeper.cancel.cancel();
            let _ = sweeper.handle.await;
        }
    }
}

impl Drop for RateLimiterRegistry {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.sweeper.lock()
            && let Some(sweeper) = slot.take()
        {
            sweeper.cancel.cancel();
        }
    }
}
