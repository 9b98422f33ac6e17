//! Configuration loading contract shared by GymTrack crates
//!
//! Every configuration type is layered the same way:
//! 1. Compiled-in defaults (`Default` impl)
//! 2. A TOML file, when one is present
//! 3. Environment variables with a crate-specific prefix, `__` separating nested keys

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The layered sources could not be merged into the target type
    #[error("Failed to parse configuration: {details}")]
    ParseError { details: String },

    /// A value was present but not acceptable
    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Loader implemented by every configuration type in the workspace
pub trait ConfigLoader<T> {
    /// Load from defaults, the optional TOML file and the environment
    fn load(path: Option<PathBuf>) -> Result<T, ConfigurationError>;

    /// Load from a specific file, still honoring environment overrides
    fn load_from_file(path: &Path) -> Result<T, ConfigurationError>;

    /// Re-apply environment overrides on top of an existing value
    fn apply_env_overrides(config: &mut T, prefix: &str) -> Result<(), ConfigurationError>;
}

/// Build the standard layered figment for `T`.
///
/// A missing TOML file is not an error; figment simply contributes nothing for it.
pub fn layered<T>(defaults: &T, file: &Path, env_prefix: &str) -> Figment
where
    T: Serialize,
{
    Figment::from(Serialized::defaults(defaults))
        .merge(Toml::file(file))
        .merge(Env::prefixed(env_prefix).split("__"))
}

/// Extract `T` from a figment, mapping failures into [`ConfigurationError`]
pub fn extract<T>(figment: Figment) -> Result<T, ConfigurationError>
where
    T: DeserializeOwned,
{
    figment.extract().map_err(|e| ConfigurationError::ParseError {
        details: e.to_string(),
    })
}
