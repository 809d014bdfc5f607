//! Business logic services for the application layer.

pub mod admission_service;
pub mod auth_service;
pub mod link_service;
pub mod stats_service;

pub use admission_service::{AdmissionService, AllocationQuota, LimiterPolicy, RedirectLimit};
pub use auth_service::{ApiKey, AuthService};
pub use link_service::{AllocationRequest, AllocationSettings, LinkService, Resolution};
pub use stats_service::{LinkStats, StatsService};
