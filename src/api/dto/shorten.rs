//! DTOs for the link shortening endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::AllocationRequest;
use crate::domain::entities::{Caller, RedirectKind, UrlRecord};

/// Request to shorten a URL.
///
/// ```json
/// {
///   "url": "https://example.com/a",
///   "custom_code": "launch",
///   "redirect": "permanent",
///   "one_shot": false,
///   "force_new": false
/// }
/// ```
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// Target URL. A missing scheme defaults to `https://`.
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: String,

    /// Optional caller-chosen code. Tier rules apply on top of these bounds.
    #[validate(length(min = 4, max = 8, message = "Custom code must be 4-8 characters"))]
    pub custom_code: Option<String>,

    /// `temporary` (307, default) or `permanent` (308).
    #[serde(default)]
    pub redirect: RedirectKind,

    /// The link stops working after its first redirect.
    #[serde(default)]
    pub one_shot: bool,

    /// Always create a new link instead of reusing an equivalent one.
    #[serde(default)]
    pub force_new: bool,
}

impl ShortenRequest {
    pub fn into_allocation(self, caller: Caller) -> AllocationRequest {
        AllocationRequest {
            long_url: self.url,
            custom_code: self.custom_code,
            kind: self.redirect,
            caller,
            one_shot: self.one_shot,
            force_new: self.force_new,
        }
    }
}

/// JSON representation of a short link.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkResponse {
    pub code: String,
    pub short_url: String,
    pub long_url: String,
    pub redirect: RedirectKind,
    pub one_shot: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl LinkResponse {
    pub fn from_record(record: UrlRecord, short_url: String) -> Self {
        Self {
            code: record.code,
            short_url,
            long_url: record.long_url,
            redirect: record.kind,
            one_shot: record.one_shot,
            created_at: record.created_at,
            expires_at: record.expires_at,
        }
    }
}
