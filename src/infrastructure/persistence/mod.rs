//! Store implementations.
//!
//! # Stores
//!
//! - [`PgUrlStore`] / [`PgClickStore`] - PostgreSQL, used when `DATABASE_URL` is set
//! - [`MemoryUrlStore`] / [`MemoryClickStore`] - In-process maps for single-node
//!   deployments and tests

pub mod memory_click_store;
pub mod memory_url_store;
pub mod pg_click_store;
pub mod pg_url_store;

pub use memory_click_store::MemoryClickStore;
pub use memory_url_store::MemoryUrlStore;
pub use pg_click_store::PgClickStore;
pub use pg_url_store::PgUrlStore;
