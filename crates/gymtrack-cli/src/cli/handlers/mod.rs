//! Command handlers for the GymTrack CLI

pub mod config;
pub mod exercises;
pub mod profile;
pub mod session;

use crate::error::{CliError, Result};
use gymtrack_sdk::auth::store::default_data_dir;
use gymtrack_sdk::{ClientBuilder, ClientConfig, FileCredentialStore, GymClient, SignOutHandle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Directory holding the persisted session
pub fn session_dir(config: &ClientConfig) -> Result<PathBuf> {
    match &config.storage.data_dir {
        Some(dir) => Ok(dir.clone()),
        None => default_data_dir()
            .map_err(|e| CliError::internal(format!("Failed to get data directory: {e}"))),
    }
}

/// Removes the stored session. The command's own error tells the user to sign in.
fn sign_out_handler(session_file: PathBuf) -> SignOutHandle {
    Arc::new(move || match std::fs::remove_file(&session_file) {
        Ok(()) => info!(path = %session_file.display(), "Removed expired session"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove stored session: {}", e),
    })
}

/// Client backed by the on-disk session
pub fn build_client(config: &ClientConfig) -> Result<GymClient> {
    let store = Arc::new(FileCredentialStore::new(session_dir(config)?));
    let on_sign_out = sign_out_handler(store.path().to_path_buf());

    ClientBuilder::from_config(config)
        .with_credential_store(store)
        .on_sign_out(on_sign_out)
        .build()
        .map_err(|e| CliError::api(e, "Could not create the API client"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sign_out_handler_removes_session_file() {
        let dir = TempDir::new().unwrap();
        let session_file = dir.path().join("session.json");
        std::fs::write(&session_file, "{}").unwrap();

        let handler = sign_out_handler(session_file.clone());
        handler();
        assert!(!session_file.exists());

        // Already gone is fine
        handler();
        assert!(!session_file.exists());
    }
}
