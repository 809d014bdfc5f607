//! Repository trait for short URL persistence.

use crate::domain::entities::{NewUrlRecord, RedirectKind, UrlRecord};
use crate::domain::errors::StoreError;
use async_trait::async_trait;

/// Persistence contract for URL mappings.
///
/// The store is the single authority for short code uniqueness: `insert` must
/// perform an atomic check-and-set on the code and report a collision as
/// [`StoreError::DuplicateCode`], distinct from every other failure.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::MemoryUrlStore`] - In-process DashMap store
/// - [`crate::infrastructure::persistence::PgUrlStore`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlStore: Send + Sync {
    /// Inserts a new mapping and returns it with the assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateCode`] if the short code is already stored.
    /// Returns [`StoreError::Backend`] on any other failure.
    async fn insert(&self, record: NewUrlRecord) -> Result<UrlRecord, StoreError>;

    /// Finds a mapping by its short code, live or not.
    async fn find_by_code(&self, code: &str) -> Result<Option<UrlRecord>, StoreError>;

    /// Finds the newest mapping for the `(long_url, kind, owner)` reuse key.
    ///
    /// One-shot mappings are never returned, since they cannot be shared.
    async fn find_by_long_url(
        &self,
        long_url: &str,
        kind: RedirectKind,
        owner_id: Option<i64>,
    ) -> Result<Option<UrlRecord>, StoreError>;

    /// Lists mappings owned by an account, newest first.
    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<UrlRecord>, StoreError>;

    /// Replaces the stored mapping currently keyed by `code` with `record`.
    ///
    /// `record.code` may differ from `code`, in which case the mapping moves.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if nothing is stored under `code`.
    /// Returns [`StoreError::DuplicateCode`] if the new code is taken.
    async fn update(&self, code: &str, record: &UrlRecord) -> Result<(), StoreError>;

    /// Deletes the mapping stored under `code`.
    ///
    /// Returns `Ok(true)` only for the call that actually removed it.
    async fn delete(&self, code: &str) -> Result<bool, StoreError>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
