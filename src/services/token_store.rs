use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ServerError;
use crate::models::TokenPair;
use crate::services::{identity_file_name, OAuthClient};

/// File-backed store of first-stage token pairs, one file per identity.
/// Loading refreshes transparently when the stored pair has expired.
pub struct TokenStore {
    dir: PathBuf,
    oauth: Arc<OAuthClient>,
}

impl TokenStore {
    pub fn new(dir: PathBuf, oauth: Arc<OAuthClient>) -> Result<Self, ServerError> {
        fs::create_dir_all(&dir)
            .map_err(|e| ServerError::Storage(format!("Failed to create tokens directory: {e}")))?;
        Ok(Self { dir, oauth })
    }

    fn path_for(&self, identity: &str) -> PathBuf {
        self.dir.join(identity_file_name(identity))
    }

    pub fn save(&self, identity: &str, tokens: &TokenPair) -> Result<(), ServerError> {
        let data = serde_json::to_string_pretty(tokens)
            .map_err(|e| ServerError::Internal(format!("Failed to serialize tokens: {e}")))?;
        fs::write(self.path_for(identity), data)
            .map_err(|e| ServerError::Storage(format!("Failed to write tokens: {e}")))
    }

    fn read(&self, identity: &str) -> Result<Option<TokenPair>, ServerError> {
        match fs::read_to_string(self.path_for(identity)) {
            Ok(data) => serde_json::from_str(&data)
                .map(Some)
                .map_err(|e| ServerError::Storage(format!("Corrupt token file: {e}"))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ServerError::Storage(format!("Failed to read tokens: {e}"))),
        }
    }

    /// Load the stored pair, refreshing transparently when expired.
    ///
    /// An expired pair with no refresh token is terminally invalid and
    /// reported as absent.
    pub async fn load(&self, identity: &str) -> Result<Option<TokenPair>, ServerError> {
        let Some(stored) = self.read(identity)? else {
            return Ok(None);
        };
        if !stored.is_expired() {
            return Ok(Some(stored));
        }
        let Some(refresh_token) = stored.refresh_token.as_deref() else {
            tracing::debug!(identity = %identity, "Stored tokens expired with no refresh token");
            return Ok(None);
        };

        tracing::info!(identity = %identity, "Refreshing expired token pair");
        let refreshed = self.oauth.refresh(refresh_token).await?;
        self.save(identity, &refreshed)?;
        Ok(Some(refreshed))
    }
}
