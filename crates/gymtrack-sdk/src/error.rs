//! Error types for the GymTrack SDK
//!
//! Non-2xx responses are parsed exactly once, at the transport boundary, into
//! [`ResponseError`]. Everything downstream matches on that closed set instead of
//! probing response bodies.

use crate::auth::StoreError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code sent by the backend when the access token has expired
pub const TOKEN_EXPIRED: &str = "token.expired";

/// Error code sent by the backend when the access token is not recognised
pub const TOKEN_INVALID: &str = "token.invalid";

/// Main error type for the GymTrack SDK
#[derive(Debug, Error)]
pub enum ApiError {
    /// No structured response reached the client (network failure, timeout, malformed body)
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Structured, non-auth error returned by the backend
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The session could not be recovered; the application has been signed out
    #[error("Session expired")]
    AuthExpired,

    /// The request could not be built
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Credential storage failure during an explicit session operation
    #[error("Credential storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Get error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Transport { .. } => "GYMTRACK_TRANSPORT_ERROR",
            ApiError::Server { .. } => "GYMTRACK_SERVER_ERROR",
            ApiError::AuthExpired => "GYMTRACK_AUTH_EXPIRED",
            ApiError::InvalidRequest { .. } => "GYMTRACK_INVALID_REQUEST",
            ApiError::Storage(_) => "GYMTRACK_STORAGE_ERROR",
        }
    }

    /// Whether the caller may reasonably retry the same request later.
    /// The SDK itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }

    /// Whether the error ended the authenticated session
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::AuthExpired)
    }

    /// Message suitable for a user-facing notification.
    ///
    /// Backend messages are shown verbatim; anything else falls back to `fallback`.
    pub fn display_message<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self {
            ApiError::Server { message, .. } if !message.is_empty() => message.as_str(),
            _ => fallback,
        }
    }

    pub(crate) fn transport(message: impl Into<String>) -> Self {
        ApiError::Transport {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::transport(format!("request timed out: {err}"))
        } else if err.is_builder() {
            ApiError::InvalidRequest {
                message: err.to_string(),
            }
        } else {
            ApiError::transport(err.to_string())
        }
    }
}

/// Error body carried by every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub message: String,
}

/// Why the backend rejected the presented credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// `token.expired`
    TokenExpired,
    /// `token.invalid`
    TokenInvalid,
    /// Any other 401; the envelope message when one was present
    Other(Option<String>),
}

impl AuthRejection {
    /// Only expired and invalid tokens can be recovered by a refresh
    pub fn is_refreshable(&self) -> bool {
        matches!(self, AuthRejection::TokenExpired | AuthRejection::TokenInvalid)
    }
}

/// Classification of a non-2xx response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseError {
    /// HTTP 401
    Auth(AuthRejection),
    /// Any other status with a parseable error envelope
    Server { status: u16, message: String },
    /// Any other status without a parseable error envelope
    Unstructured { status: u16 },
}

impl ResponseError {
    /// Classify a failed response from its status and raw body
    pub fn classify(status: StatusCode, body: &[u8]) -> Self {
        let envelope = serde_json::from_slice::<ErrorEnvelope>(body).ok();

        if status == StatusCode::UNAUTHORIZED {
            let rejection = match envelope.map(|e| e.message) {
                Some(code) if code == TOKEN_EXPIRED => AuthRejection::TokenExpired,
                Some(code) if code == TOKEN_INVALID => AuthRejection::TokenInvalid,
                other => AuthRejection::Other(other),
            };
            return ResponseError::Auth(rejection);
        }

        match envelope {
            Some(envelope) => ResponseError::Server {
                status: status.as_u16(),
                message: envelope.message,
            },
            None => ResponseError::Unstructured {
                status: status.as_u16(),
            },
        }
    }

    /// Terminal error for a response that will not be recovered.
    ///
    /// A rejected credential keeps the backend's message when one was sent, matching
    /// how every other structured error is surfaced.
    pub fn into_api_error(self) -> ApiError {
        match self {
            ResponseError::Server { status, message } => ApiError::Server { status, message },
            ResponseError::Auth(AuthRejection::Other(Some(message))) => ApiError::Server {
                status: StatusCode::UNAUTHORIZED.as_u16(),
                message,
            },
            ResponseError::Auth(AuthRejection::TokenExpired) => ApiError::Server {
                status: StatusCode::UNAUTHORIZED.as_u16(),
                message: TOKEN_EXPIRED.to_string(),
            },
            ResponseError::Auth(AuthRejection::TokenInvalid) => ApiError::Server {
                status: StatusCode::UNAUTHORIZED.as_u16(),
                message: TOKEN_INVALID.to_string(),
            },
            ResponseError::Auth(AuthRejection::Other(None)) => {
                ApiError::transport("request rejected with status 401 and no error body")
            }
            ResponseError::Unstructured { status } => {
                ApiError::transport(format!("request failed with status {status} and no error body"))
            }
        }
    }
}
