//! URL record entity representing a short code to long URL mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP redirect semantics of a mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectKind {
    Permanent,
    #[default]
    Temporary,
}

impl RedirectKind {
    /// Stable textual form used by storage and the HTTP layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permanent => "permanent",
            Self::Temporary => "temporary",
        }
    }
}

impl fmt::Display for RedirectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RedirectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "permanent" => Ok(Self::Permanent),
            "temporary" => Ok(Self::Temporary),
            other => Err(format!("unknown redirect kind '{other}'")),
        }
    }
}

/// A stored short URL mapping.
///
/// `owner_id` is `None` for mappings created by anonymous callers. A record whose
/// `expires_at` is in the past is logically dead even while it is still stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub id: i64,
    pub code: String,
    pub long_url: String,
    pub kind: RedirectKind,
    pub owner_id: Option<i64>,
    pub one_shot: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl UrlRecord {
    /// Returns true if the record has passed its expiry time at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Returns true if `owner_id` owns this record. Anonymous records have no owner.
    pub fn is_owned_by(&self, owner_id: i64) -> bool {
        self.owner_id == Some(owner_id)
    }
}

/// Input data for inserting a new record. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrlRecord {
    pub code: String,
    pub long_url: String,
    pub kind: RedirectKind,
    pub owner_id: Option<i64>,
    pub one_shot: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewUrlRecord {
    /// Materializes the record with the id assigned by the store.
    pub fn into_record(self, id: i64) -> UrlRecord {
        UrlRecord {
            id,
            code: self.code,
            long_url: self.long_url,
            kind: self.kind,
            owner_id: self.owner_id,
            one_shot: self.one_shot,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

/// Owner-initiated edit of an existing mapping.
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UrlPatch {
    pub long_url: Option<String>,
    pub code: Option<String>,
    pub kind: Option<RedirectKind>,
}
