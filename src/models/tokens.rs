use chrono::{serde::ts_seconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

/// First-stage token pair issued by the identity provider.
///
/// `expires_at` is stored as epoch seconds. An expired pair with no refresh
/// token is terminally invalid; the token store reports it as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(with = "ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl TokenPair {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Short-lived vehicle-API token obtained by exchanging a [`TokenPair`].
/// Valid only for the (identity, device) pair it was issued under; never
/// persisted, recomputed per request chain.
#[derive(Debug, Clone)]
pub struct ApiToken {
    pub access_token: String,
    pub expires_in: u64,
    pub expires_at: DateTime<Utc>,
}
