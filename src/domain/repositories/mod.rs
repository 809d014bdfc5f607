//! Repository trait definitions for the domain layer.
//!
//! Traits define the persistence contract; implementations live in
//! `crate::infrastructure::persistence`. Mocks are generated with `mockall`
//! for unit tests.

pub mod click_store;
pub mod url_store;

pub use click_store::ClickStore;
pub use url_store::UrlStore;

#[cfg(test)]
pub use click_store::MockClickStore;
#[cfg(test)]
pub use url_store::MockUrlStore;
