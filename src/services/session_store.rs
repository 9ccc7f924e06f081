use std::fs;
use std::io;
use std::path::PathBuf;

use crate::error::ServerError;
use crate::models::SessionCheckpoint;
use crate::services::identity_file_name;

/// File-backed store of login checkpoints, one file per identity.
///
/// A checkpoint exists iff a login for that identity is awaiting MFA
/// completion; the verify step consumes and deletes it.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: PathBuf) -> Result<Self, ServerError> {
        fs::create_dir_all(&dir).map_err(|e| {
            ServerError::Storage(format!("Failed to create sessions directory: {e}"))
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, identity: &str) -> PathBuf {
        self.dir.join(identity_file_name(identity))
    }

    pub fn read(&self, identity: &str) -> Result<Option<SessionCheckpoint>, ServerError> {
        match fs::read_to_string(self.path_for(identity)) {
            Ok(data) => serde_json::from_str(&data)
                .map(Some)
                .map_err(|e| ServerError::Storage(format!("Corrupt session file: {e}"))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ServerError::Storage(format!("Failed to read session: {e}"))),
        }
    }

    pub fn write(&self, identity: &str, checkpoint: &SessionCheckpoint) -> Result<(), ServerError> {
        let data = serde_json::to_string_pretty(checkpoint)
            .map_err(|e| ServerError::Internal(format!("Failed to serialize session: {e}")))?;
        fs::write(self.path_for(identity), data)
            .map_err(|e| ServerError::Storage(format!("Failed to write session: {e}")))
    }

    /// Deleting a session that does not exist is not an error.
    pub fn delete(&self, identity: &str) -> Result<(), ServerError> {
        match fs::remove_file(self.path_for(identity)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ServerError::Storage(format!("Failed to delete session: {e}"))),
        }
    }
}
