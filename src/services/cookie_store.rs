use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use url::Url;

use crate::error::ServerError;
use crate::services::identity_file_name;

type JarState = HashMap<String, HashMap<String, String>>;

/// In-memory cookie jar that can be serialized between requests.
///
/// Cookies are keyed by host and name only. The login dance spans two hosts
/// and neither relies on path scoping or expiry attributes, so the cookie
/// attributes past the first `name=value` pair are dropped.
#[derive(Debug, Default)]
pub struct PersistentJar {
    state: RwLock<JarState>,
}

impl PersistentJar {
    fn from_state(state: JarState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    fn snapshot(&self) -> JarState {
        self.state.read().map(|s| s.clone()).unwrap_or_default()
    }
}

impl CookieStore for PersistentJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let Some(host) = url.host_str() else { return };
        let Ok(mut state) = self.state.write() else {
            return;
        };
        let entries = state.entry(host.to_string()).or_default();
        for header in cookie_headers {
            let Ok(raw) = header.to_str() else { continue };
            let pair = raw.split(';').next().unwrap_or("");
            if let Some((name, value)) = pair.split_once('=') {
                entries.insert(name.trim().to_string(), value.trim().to_string());
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let host = url.host_str()?;
        let state = self.state.read().ok()?;
        let entries = state.get(host)?;
        if entries.is_empty() {
            return None;
        }
        let header = entries
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&header).ok()
    }
}

/// File-backed store of per-identity cookie jars. Saving is best effort: a
/// failed write is logged and the request that triggered it proceeds.
pub struct CookieJarStore {
    dir: PathBuf,
}

impl CookieJarStore {
    pub fn new(dir: PathBuf) -> Result<Self, ServerError> {
        fs::create_dir_all(&dir)
            .map_err(|e| ServerError::Storage(format!("Failed to create cookies directory: {e}")))?;
        Ok(Self { dir })
    }

    fn path_for(&self, identity: &str) -> PathBuf {
        self.dir.join(identity_file_name(identity))
    }

    /// Load the persisted jar for an identity, or a fresh one if none exists
    /// or the file is unreadable.
    pub fn load(&self, identity: &str) -> Arc<PersistentJar> {
        let state = fs::read_to_string(self.path_for(identity))
            .ok()
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default();
        Arc::new(PersistentJar::from_state(state))
    }

    pub fn save(&self, identity: &str, jar: &PersistentJar) {
        let path = self.path_for(identity);
        match serde_json::to_string(&jar.snapshot()) {
            Ok(data) => {
                if let Err(e) = fs::write(&path, data) {
                    tracing::warn!(error = %e, "Failed to persist cookie jar");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize cookie jar"),
        }
    }

    /// Remove an identity's jar. A fresh login starts from a clean slate.
    pub fn delete(&self, identity: &str) {
        if let Err(e) = fs::remove_file(self.path_for(identity)) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(error = %e, "Failed to delete cookie jar");
            }
        }
    }
}
