//! Caller identity and tier classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller classification governing code length, TTL and quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Anonymous,
    Authenticated,
    Premium,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Authenticated => "authenticated",
            Self::Premium => "premium",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anonymous" => Ok(Self::Anonymous),
            "authenticated" | "free" => Ok(Self::Authenticated),
            "premium" => Ok(Self::Premium),
            other => Err(format!("unknown tier '{other}'")),
        }
    }
}

/// The party on whose behalf an operation runs.
///
/// Anonymous callers carry no account id; their mappings are stored with an empty owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Caller {
    account_id: Option<i64>,
    tier: Tier,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self {
            account_id: None,
            tier: Tier::Anonymous,
        }
    }

    /// An identified account. `Tier::Anonymous` is promoted to `Tier::Authenticated`,
    /// since every account holder is at least authenticated.
    pub fn account(account_id: i64, tier: Tier) -> Self {
        let tier = match tier {
            Tier::Anonymous => Tier::Authenticated,
            other => other,
        };
        Self {
            account_id: Some(account_id),
            tier,
        }
    }

    pub fn account_id(&self) -> Option<i64> {
        self.account_id
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn is_anonymous(&self) -> bool {
        self.account_id.is_none()
    }
}

impl Default for Caller {
    fn default() -> Self {
        Self::anonymous()
    }
}
