//! Error types for the GymTrack CLI

use color_eyre::eyre::Report;
use gymtrack_sdk::ApiError;
use thiserror::Error;

/// CLI error type with minimal variants
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file issues
    #[error("Configuration error: {0}")]
    Config(#[from] gymtrack_common::ConfigurationError),

    /// A request failed; `message` is what the user is shown
    #[error("{message}")]
    Api {
        message: String,
        #[source]
        source: ApiError,
    },

    /// Interactive prompt failed
    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// Everything else (using color-eyre's Report for rich errors)
    #[error(transparent)]
    Internal(#[from] Report),
}

impl CliError {
    /// Wrap an SDK error, showing the server's message or `fallback`
    pub fn api(source: ApiError, fallback: &str) -> Self {
        let message = match &source {
            ApiError::AuthExpired => "Your session has expired. Run 'gymtrack login' again.",
            other => other.display_message(fallback),
        }
        .to_string();
        CliError::Api { message, source }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CliError::Internal(Report::msg(message.into()))
    }
}

impl From<ApiError> for CliError {
    fn from(source: ApiError) -> Self {
        CliError::api(source, "Something went wrong. Please try again later.")
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
