//! Client configuration
//!
//! Loaded from compiled-in defaults, then `gymtrack.toml` (or an explicit path),
//! then `GYMTRACK_*` environment variables. Nested keys use `__`, for example
//! `GYMTRACK_API__BASE_URL`.

use crate::client::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use figment::{
    providers::{Env, Serialized},
    Figment,
};
use gymtrack_common::config::{extract, layered};
use gymtrack_common::{ConfigLoader, ConfigurationError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment prefix for every client setting
pub const ENV_PREFIX: &str = "GYMTRACK_";

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "gymtrack.toml";

/// API connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,

    /// Whole-request timeout, refresh calls included
    pub timeout_secs: u64,

    pub connect_timeout_secs: Option<u64>,

    pub pool_max_idle_per_host: Option<usize>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: None,
            pool_max_idle_per_host: None,
        }
    }
}

/// Where the session is persisted
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Overrides the platform data directory
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.api.connect_timeout_secs.map(Duration::from_secs)
    }

    fn validate(self) -> Result<Self, ConfigurationError> {
        if self.api.timeout_secs == 0 {
            return Err(ConfigurationError::InvalidValue {
                key: "api.timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigurationError::InvalidValue {
                key: "api.base_url".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(self)
    }
}

impl ConfigLoader<ClientConfig> for ClientConfig {
    fn load(path: Option<PathBuf>) -> Result<ClientConfig, ConfigurationError> {
        let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from_file(&path)
    }

    fn load_from_file(path: &Path) -> Result<ClientConfig, ConfigurationError> {
        extract::<ClientConfig>(layered(&ClientConfig::default(), path, ENV_PREFIX))?.validate()
    }

    fn apply_env_overrides(
        config: &mut ClientConfig,
        prefix: &str,
    ) -> Result<(), ConfigurationError> {
        let figment = Figment::from(Serialized::defaults(config.clone()))
            .merge(Env::prefixed(prefix).split("__"));
        *config = extract::<ClientConfig>(figment)?.validate()?;
        Ok(())
    }
}
