//! HTTP middleware for request processing and protection.
//!
//! Provides caller identification, admission control, and observability middleware.

pub mod identity;
pub mod rate_limit;
pub mod tracing;
