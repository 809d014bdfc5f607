//! Caller identification from API keys.

use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use std::collections::HashMap;
use std::str::FromStr;

use crate::domain::entities::{Caller, Tier};
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// A configured API key and the account it identifies.
///
/// Parsed from `token=account_id:tier`, e.g. `k3y=42:premium`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub token: String,
    pub account_id: i64,
    pub tier: Tier,
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("token", &"***")
            .field("account_id", &self.account_id)
            .field("tier", &self.tier)
            .finish()
    }
}

impl FromStr for ApiKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (token, identity) = s
            .split_once('=')
            .ok_or_else(|| "expected 'token=account_id:tier'".to_string())?;
        let (account_id, tier) = identity
            .split_once(':')
            .ok_or_else(|| "expected 'account_id:tier' after '='".to_string())?;

        let token = token.trim();
        if token.is_empty() {
            return Err("API key token must not be empty".to_string());
        }

        let account_id = account_id
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("invalid account id: {e}"))?;

        let tier = tier.trim().parse::<Tier>()?;
        if tier == Tier::Anonymous {
            return Err("API keys cannot map to the anonymous tier".to_string());
        }

        Ok(Self {
            token: token.to_string(),
            account_id,
            tier,
        })
    }
}

/// Parses a `;`-separated list of [`ApiKey`]s. Blank entries are skipped.
pub fn parse_api_keys(raw: &str) -> Result<Vec<ApiKey>, String> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ApiKey::from_str)
        .collect()
}

/// Service for identifying API callers via Bearer tokens.
///
/// Tokens are kept only as HMAC-SHA256 digests keyed by `signing_secret`, so a
/// memory dump of the key table does not reveal usable credentials.
pub struct AuthService {
    keys: HashMap<String, Caller>,
    signing_secret: String,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// # Arguments
    ///
    /// - `keys` - configured API keys
    /// - `signing_secret` - HMAC key used to digest tokens
    pub fn new(keys: impl IntoIterator<Item = ApiKey>, signing_secret: String) -> Self {
        let mut service = Self {
            keys: HashMap::new(),
            signing_secret,
        };

        for key in keys {
            let digest = service.hash_token(&key.token);
            service
                .keys
                .insert(digest, Caller::account(key.account_id, key.tier));
        }

        service
    }

    /// Hashes a raw token with HMAC-SHA256 using the server signing secret.
    ///
    /// Returns a 64-character lowercase hex-encoded MAC.
    fn hash_token(&self, token: &str) -> String {
        let Ok(mut mac) = HmacSha256::new_from_slice(self.signing_secret.as_bytes()) else {
            return String::new();
        };
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Resolves a raw token to the caller it identifies.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token matches no configured key.
    pub fn identify(&self, token: &str) -> Result<Caller, AppError> {
        self.keys
            .get(&self.hash_token(token))
            .copied()
            .ok_or_else(|| {
                AppError::unauthorized("Unauthorized", json!({"reason": "Invalid API key"}))
            })
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}
