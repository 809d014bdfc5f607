//! Core domain entities.
//!
//! Entities are plain data structures; the allocation and admission logic that
//! operates on them lives in [`crate::application::services`].
//!
//! # Entity Types
//!
//! - [`UrlRecord`] - A short code to long URL mapping
//! - [`Caller`] - The identity and [`Tier`] a request runs under
//! - [`TokenBucket`] - Per-client rate limiter state
//! - [`Click`] - One resolution of a short link, kept for owner statistics
//!
//! New records are described by [`NewUrlRecord`] and [`NewClick`]; owner edits by
//! [`UrlPatch`].

pub mod caller;
pub mod click;
pub mod token_bucket;
pub mod url_record;

pub use caller::{Caller, Tier};
pub use click::{Click, NewClick};
pub use token_bucket::TokenBucket;
pub use url_record::{NewUrlRecord, RedirectKind, UrlPatch, UrlRecord};
