//! Request admission across the redirect burst limiter and the allocation quota.

use chrono::Duration;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::clock::Clock;
use crate::domain::entities::{Caller, Tier};
use crate::domain::errors::CoreError;
use crate::infrastructure::rate_limit::RateLimiterRegistry;

/// Which limiter guards an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimiterPolicy {
    /// Short-window burst limiter on short link resolution, keyed by IP.
    Redirect,
    /// Long-window quota on short link creation, keyed by IP or account.
    Allocation,
}

/// Burst limiter settings for the redirect endpoint.
#[derive(Debug, Clone)]
pub struct RedirectLimit {
    pub enabled: bool,
    pub burst: u32,
    pub per_second: f64,
    pub retention: Duration,
    pub sweep_every: std::time::Duration,
}

impl Default for RedirectLimit {
    fn default() -> Self {
        Self {
            enabled: true,
            burst: 4,
            per_second: 2.0,
            retention: Duration::minutes(3),
            sweep_every: std::time::Duration::from_secs(60),
        }
    }
}

/// Allocation quota settings.
///
/// A `None` quota means the tier is unlimited. Tokens refill evenly across
/// `window`, so a quota of 10 per day earns one allocation every 2.4 hours.
#[derive(Debug, Clone)]
pub struct AllocationQuota {
    pub enabled: bool,
    pub anonymous: Option<u32>,
    pub authenticated: Option<u32>,
    pub premium: Option<u32>,
    pub window: Duration,
    pub retention: Duration,
    pub sweep_every: std::time::Duration,
}

impl AllocationQuota {
    pub fn quota_for(&self, tier: Tier) -> Option<u32> {
        match tier {
            Tier::Anonymous => self.anonymous,
            Tier::Authenticated => self.authenticated,
            Tier::Premium => self.premium,
        }
    }

    fn refill_per_sec(&self, quota: u32) -> f64 {
        let window_secs = self.window.num_seconds().max(1) as f64;
        f64::from(quota) / window_secs
    }
}

impl Default for AllocationQuota {
    fn default() -> Self {
        Self {
            enabled: true,
            anonymous: Some(3),
            authenticated: Some(10),
            premium: None,
            window: Duration::hours(24),
            retention: Duration::hours(48),
            sweep_every: std::time::Duration::from_secs(60),
        }
    }
}

/// Gatekeeper for the redirect and allocation paths.
///
/// Each policy owns an independent [`RateLimiterRegistry`] with its own retention
/// window.
pub struct AdmissionService {
    redirect: Arc<RateLimiterRegistry>,
    allocation: Arc<RateLimiterRegistry>,
    redirect_limit: RedirectLimit,
    allocation_quota: AllocationQuota,
}

impl AdmissionService {
    /// Creates the service without background sweeps.
    pub fn new(
        redirect_limit: RedirectLimit,
        allocation_quota: AllocationQuota,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let redirect = Arc::new(RateLimiterRegistry::new(
            "redirect",
            redirect_limit.retention,
            clock.clone(),
        ));
        let allocation = Arc::new(RateLimiterRegistry::new(
            "allocation",
            allocation_quota.retention,
            clock,
        ));

        Self {
            redirect,
            allocation,
            redirect_limit,
            allocation_quota,
        }
    }

    /// Creates the service and starts both registries' sweeps.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        redirect_limit: RedirectLimit,
        allocation_quota: AllocationQuota,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let service = Self::new(redirect_limit, allocation_quota, clock);
        service
            .redirect
            .spawn_sweeper(service.redirect_limit.sweep_every);
        service
            .allocation
            .spawn_sweeper(service.allocation_quota.sweep_every);
        service
    }

    /// Attempts to admit one request under `policy`.
    ///
    /// Redirects are keyed by `client_ip`. Allocations are keyed by account for
    /// identified callers and by `client_ip` for anonymous ones.
    pub fn admit(&self, policy: LimiterPolicy, caller: &Caller, client_ip: IpAddr) -> bool {
        match policy {
            LimiterPolicy::Redirect => self.admit_redirect(client_ip),
            LimiterPolicy::Allocation => self.admit_allocation(caller, client_ip),
        }
    }

    /// Like [`admit`](Self::admit), but reports rejection as [`CoreError::RateLimited`].
    pub fn check(
        &self,
        policy: LimiterPolicy,
        caller: &Caller,
        client_ip: IpAddr,
    ) -> Result<(), CoreError> {
        if self.admit(policy, caller, client_ip) {
            Ok(())
        } else {
            Err(CoreError::RateLimited)
        }
    }

    fn admit_redirect(&self, client_ip: IpAddr) -> bool {
        if !self.redirect_limit.enabled {
            return true;
        }

        let allowed = self.redirect.admit(
            &client_ip.to_string(),
            self.redirect_limit.burst,
            self.redirect_limit.per_second,
        );

        if !allowed {
            debug!(ip = %client_ip, "Redirect burst limit exceeded");
        }
        allowed
    }

    fn admit_allocation(&self, caller: &Caller, client_ip: IpAddr) -> bool {
        if !self.allocation_quota.enabled {
            return true;
        }

        let Some(quota) = self.allocation_quota.quota_for(caller.tier()) else {
            return true;
        };

        let key = allocation_key(caller, client_ip);
        let allowed = self.allocation.admit(
            &key,
            quota,
            self.allocation_quota.refill_per_sec(quota),
        );

        if !allowed {
            warn!(key = %key, tier = %caller.tier(), quota, "Allocation quota exhausted");
        }
        allowed
    }

    pub fn registry(&self, policy: LimiterPolicy) -> &RateLimiterRegistry {
        match policy {
            LimiterPolicy::Redirect => &self.redirect,
            LimiterPolicy::Allocation => &self.allocation,
        }
    }

    /// Stops both background sweeps.
    pub async fn shutdown(&self) {
        self.redirect.shutdown().await;
        self.allocation.shutdown().await;
    }
}

/// Registry key for the allocation quota.
fn allocation_key(caller: &Caller, client_ip: IpAddr) -> String {
    match caller.account_id() {
        Some(id) => format!("account:{id}"),
        None => format!("ip:{client_ip}"),
    }
}
