//! Infrastructure layer for storage and in-process state.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`persistence`] - `UrlStore` implementations (in-memory and PostgreSQL)
//! - [`rate_limit`] - Token bucket registries backing admission control

pub mod persistence;
pub mod rate_limit;
