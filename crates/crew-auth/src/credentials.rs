//! Persisted session cache.
//!
//! Sessions survive process restarts via a JSON file under the crewdeck
//! base directory. A corrupt or unreadable cache is treated as absent, not
//! fatal.

use crate::types::AuthSession;
use crate::AuthResult;
use crew_core::Paths;
use std::path::PathBuf;

/// File-backed store for the current session's tokens.
#[derive(Debug, Clone)]
pub struct CredentialCache {
    path: PathBuf,
}

impl CredentialCache {
    /// Create a cache at the standard location (~/.crewdeck/session.json).
    pub fn new(paths: &Paths) -> Self {
        Self {
            path: paths.session_file(),
        }
    }

    /// Create a cache at a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the persisted session, if any.
    pub fn load(&self) -> AuthResult<Option<AuthSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(session) => Ok(Some(session)),
            Err(error) => {
                tracing::warn!(error = %error, "Ignoring unreadable session cache");
                Ok(None)
            }
        }
    }

    /// Persist a session, replacing any previous one.
    pub fn save(&self, session: &AuthSession) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Remove the persisted session.
    pub fn clear(&self) -> AuthResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
