//! Persisted session credential.
//!
//! The session is a single bearer token kept under the fixed key `auth_token`.
//! It is written at login, read on every outbound request and deleted on logout
//! or when the backend answers 401.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Storage key of the bearer credential.
pub const TOKEN_KEY: &str = "auth_token";

/// Directory under the user's home where profiles keep their state.
pub const STATE_DIR: &str = ".agency-portal";

/// A process-wide key-value slot holding the bearer credential.
///
/// Implementations must be cheap to call on every request and safe to share
/// across tasks.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored credential, if any.
    fn load(&self) -> Result<Option<String>>;

    /// Replaces the stored credential.
    fn store(&self, token: &str) -> Result<()>;

    /// Deletes the stored credential. Returns `true` if one was present.
    fn clear(&self) -> Result<bool>;
}

#[derive(Debug, Serialize, Deserialize)]
struct CredentialFile {
    auth_token: String,
}

/// Credential store backed by a JSON file, one file per profile.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Store at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for a named profile under `~/.agency-portal/`.
    pub fn for_profile(profile: &str) -> Result<Self> {
        let dir = dirs::home_dir()
            .ok_or_else(|| ClientError::credential("Cannot determine home directory"))?
            .join(STATE_DIR);
        Ok(Self::at(dir.join(format!("credentials.{profile}.json"))))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| ClientError::credential(format!("{}: {e}", self.path.display())))?;
        let file: CredentialFile = serde_json::from_str(&content)
            .map_err(|e| ClientError::credential(format!("{}: {e}", self.path.display())))?;
        Ok(Some(file.auth_token).filter(|t| !t.is_empty()))
    }

    fn store(&self, token: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| ClientError::credential(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(&CredentialFile {
            auth_token: token.to_string(),
        })
        .map_err(|e| ClientError::credential(e.to_string()))?;
        fs::write(&self.path, content).map_err(|e| ClientError::credential(e.to_string()))
    }

    fn clear(&self) -> Result<bool> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| ClientError::credential(e.to_string()))?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// In-process credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        let guard = self
            .token
            .read()
            .map_err(|_| ClientError::credential("credential lock poisoned"))?;
        Ok(guard.clone())
    }

    fn store(&self, token: &str) -> Result<()> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| ClientError::credential("credential lock poisoned"))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<bool> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| ClientError::credential("credential lock poisoned"))?;
        Ok(guard.take().is_some())
    }
}

/// Shortened token for display: first and last 8 characters of long tokens.
pub fn redact(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 20 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 8..].iter().collect();
        format!("{head}...{tail}")
    } else {
        token.to_string()
    }
}
