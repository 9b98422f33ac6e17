//! Durable storage of the session's token pair
//!
//! Exactly one session is stored at a time. Every `save` completes before it
//! returns, so callers can rely on disk and memory agreeing once it succeeds.

use super::types::TokenPair;
use async_trait::async_trait;
use etcetera::{choose_base_strategy, BaseStrategy};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

const SESSION_FILE: &str = "session.json";

/// Credential storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Persistence of the current token pair
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// The stored pair, if a session exists
    async fn get(&self) -> Result<Option<TokenPair>, StoreError>;

    /// Replace the stored pair
    async fn save(&self, pair: &TokenPair) -> Result<(), StoreError>;

    /// Remove the stored pair; succeeds when nothing is stored
    async fn clear(&self) -> Result<(), StoreError>;
}

/// In-process store for tests and embedders that do not persist sessions
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    pair: RwLock<Option<TokenPair>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(pair: TokenPair) -> Self {
        Self {
            pair: RwLock::new(Some(pair)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self) -> Result<Option<TokenPair>, StoreError> {
        Ok(self.pair.read().await.clone())
    }

    async fn save(&self, pair: &TokenPair) -> Result<(), StoreError> {
        *self.pair.write().await = Some(pair.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.pair.write().await = None;
        Ok(())
    }
}

/// JSON file store under the platform data directory
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Store the session inside `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SESSION_FILE),
        }
    }

    /// Store the session in the default data directory
    /// (e.g. `~/.local/share/gymtrack` on Linux)
    pub fn in_default_dir() -> Result<Self, StoreError> {
        Ok(Self::new(default_data_dir()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self) -> Result<Option<TokenPair>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, pair: &TokenPair) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write-then-rename so a crash never leaves a half-written session
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec(pair)?).await?;
        restrict_permissions(&tmp).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Platform data directory for GymTrack session storage
pub fn default_data_dir() -> Result<PathBuf, StoreError> {
    let strategy = choose_base_strategy()
        .map_err(|e| StoreError::Config(format!("Failed to determine base directories: {e}")))?;
    Ok(strategy.data_dir().join("gymtrack"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_store_lifecycle() {
        let store = MemoryCredentialStore::new();
        assert!(store.get().await.unwrap().is_none());

        store.save(&TokenPair::new("T1", "F1")).await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some(TokenPair::new("T1", "F1")));

        store.clear().await.unwrap();
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested"));

        assert!(store.get().await.unwrap().is_none());

        store.save(&TokenPair::new("T1", "F1")).await.unwrap();
        store.save(&TokenPair::new("T2", "F2")).await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some(TokenPair::new("T2", "F2")));
        assert!(!store.path().with_extension("json.tmp").exists());

        // A second handle on the same file sees the same session
        let reopened = FileCredentialStore::new(dir.path().join("nested"));
        assert_eq!(
            reopened.get().await.unwrap(),
            Some(TokenPair::new("T2", "F2"))
        );
    }

    #[tokio::test]
    async fn test_file_store_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path());

        store.clear().await.unwrap();
        store.save(&TokenPair::new("T1", "F1")).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path());
        tokio::fs::write(store.path(), b"{not json").await.unwrap();

        assert!(matches!(store.get().await, Err(StoreError::Serde(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path());
        store.save(&TokenPair::new("T1", "F1")).await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
