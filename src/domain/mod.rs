//! Domain layer containing business entities, policies and contracts.
//!
//! The domain layer has no dependencies on infrastructure or presentation layers.
//!
//! # Architecture
//!
//! - [`entities`] - Core data structures
//! - [`repositories`] - Persistence trait definitions
//! - [`expiry_policy`] - Tiered time-to-live rules
//! - [`clock`] - Injectable time source
//! - [`click_worker`] - Background writer for redirect clicks
//! - [`errors`] - Store and core error taxonomy

pub mod click_worker;
pub mod clock;
pub mod entities;
pub mod errors;
pub mod expiry_policy;
pub mod repositories;
