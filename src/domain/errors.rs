//! Error taxonomy of the allocation and resolution core.

use thiserror::Error;

/// Failures reported by a [`crate::domain::repositories::UrlStore`].
///
/// `DuplicateCode` must be reported only for a uniqueness violation on the short
/// code; the allocator retries on it and on nothing else.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("short code '{0}' already exists")]
    DuplicateCode(String),

    #[error("record not found")]
    NotFound,

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Terminal outcomes of core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A caller-chosen code is held by a live record.
    #[error("short code '{0}' is already taken")]
    DuplicateCode(String),

    /// Every generated candidate collided.
    #[error("could not allocate a unique short code after {0} attempts")]
    AllocationExhausted(usize),

    #[error("short link not found")]
    RecordNotFound,

    /// The record existed but its expiry has passed.
    #[error("short link has expired")]
    Expired,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("invalid short code: {0}")]
    InvalidCode(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type CoreResult<T> = Result<T, CoreError>;
