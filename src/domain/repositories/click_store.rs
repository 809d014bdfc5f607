//! Repository trait for click statistics.

use crate::domain::entities::{Click, NewClick};
use crate::domain::errors::StoreError;
use async_trait::async_trait;

/// Persistence contract for redirect events.
///
/// Clicks belong to a URL record by id. Deleting the record may drop its clicks;
/// a later record reusing the same code never inherits them.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::MemoryClickStore`] - In-process store
/// - [`crate::infrastructure::persistence::PgClickStore`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickStore: Send + Sync {
    /// Stores a click and returns it with the assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on failure, including a `url_id` that no
    /// longer exists in a store that enforces the reference.
    async fn record(&self, click: NewClick) -> Result<Click, StoreError>;

    /// Counts every click of a URL record.
    async fn count_for_url(&self, url_id: i64) -> Result<i64, StoreError>;

    /// Returns up to `limit` clicks of a URL record, newest first.
    async fn list_for_url(&self, url_id: i64, limit: i64) -> Result<Vec<Click>, StoreError>;
}
