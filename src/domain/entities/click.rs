//! Click entity recorded for every resolved short link.

use chrono::{DateTime, Utc};

/// A stored redirect event.
///
/// Client metadata is optional since proxies and privacy settings may strip it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Click {
    pub id: i64,
    pub url_id: i64,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub accessed_at: DateTime<Utc>,
}

/// Input data for recording a click. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClick {
    /// Id of the [`UrlRecord`](super::UrlRecord) that was resolved.
    pub url_id: i64,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub accessed_at: DateTime<Utc>,
}

impl NewClick {
    pub fn into_click(self, id: i64) -> Click {
        Click {
            id,
            url_id: self.url_id,
            ip: self.ip,
            user_agent: self.user_agent,
            referrer: self.referrer,
            accessed_at: self.accessed_at,
        }
    }
}
