//! DTOs for per-link click statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::Click;

pub const DEFAULT_STATS_LIMIT: i64 = 100;

/// Query string of `GET /api/stats/{code}`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct StatsQuery {
    /// Most recent clicks to return (default: 100).
    #[validate(range(min = 0, max = 1000, message = "limit must be 0-1000"))]
    pub limit: Option<i64>,
}

/// One recorded redirect.
///
/// Optional fields are omitted from JSON when `None`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClickInfo {
    pub accessed_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

impl From<Click> for ClickInfo {
    fn from(click: Click) -> Self {
        Self {
            accessed_at: click.accessed_at,
            ip_address: click.ip,
            user_agent: click.user_agent,
            referrer: click.referrer,
        }
    }
}

/// Response of `GET /api/stats/{code}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
    pub total: i64,
    pub items: Vec<ClickInfo>,
}
