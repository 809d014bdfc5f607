//! In-memory rate limiter state.
//!
//! - [`RateLimiterRegistry`] - Keyed token buckets with an idle sweep

pub mod registry;

pub use registry::RateLimiterRegistry;
