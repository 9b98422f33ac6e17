//! Token refresh call
//!
//! Exchanges the refresh token for a new pair at `POST /sessions/refresh-token`.
//! Any outcome other than a 2xx response carrying both tokens is a failure; a
//! half-populated pair is never returned.

use super::types::TokenPair;
use crate::error::ApiError;
use crate::transport::{RequestDescriptor, Transport};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Path of the refresh endpoint
pub const REFRESH_PATH: &str = "/sessions/refresh-token";

/// Why a refresh attempt did not produce a new pair
#[derive(Debug, Error)]
pub enum RefreshFailure {
    /// The endpoint answered with a non-2xx status
    #[error("Refresh rejected with status {status}")]
    Rejected { status: u16 },

    /// No response reached the client (includes timeouts)
    #[error("Refresh request failed: {0}")]
    Transport(String),

    /// 2xx response without a usable token pair
    #[error("Malformed refresh response: {0}")]
    Malformed(String),
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    token: Option<String>,
    refresh_token: Option<String>,
}

/// Call the refresh endpoint with `refresh_token`
pub async fn request_token_pair(
    transport: &dyn Transport,
    refresh_token: &str,
) -> Result<TokenPair, RefreshFailure> {
    debug!("Refreshing access token");

    let request = RequestDescriptor::post_json(REFRESH_PATH, &RefreshRequest { refresh_token })
        .map_err(|e| RefreshFailure::Transport(e.to_string()))?;

    let response = transport.send(&request).await.map_err(|e| match e {
        ApiError::Transport { message } => RefreshFailure::Transport(message),
        other => RefreshFailure::Transport(other.to_string()),
    })?;

    if !response.is_success() {
        return Err(RefreshFailure::Rejected {
            status: response.status.as_u16(),
        });
    }

    let body: RefreshResponse = serde_json::from_slice(&response.body)
        .map_err(|e| RefreshFailure::Malformed(e.to_string()))?;

    let token = body
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| RefreshFailure::Malformed("missing token".into()))?;
    let refresh_token = body
        .refresh_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| RefreshFailure::Malformed("missing refresh_token".into()))?;

    info!("Token refresh completed successfully");
    Ok(TokenPair::new(token, refresh_token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;
    use crate::transport::ApiResponse;
    use reqwest::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_refresh_success() {
        let transport = ScriptedTransport::new();
        transport.on_refresh(|| {
            Ok(ApiResponse::new(
                StatusCode::OK,
                json!({"token": "T2", "refresh_token": "F2"}).to_string(),
            ))
        });

        let pair = request_token_pair(&transport, "F1").await.unwrap();
        assert_eq!(pair, TokenPair::new("T2", "F2"));

        let sent = transport.requests_to(REFRESH_PATH);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, reqwest::Method::POST);
        assert_eq!(sent[0].bearer(), None);
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(sent[0].body.as_ref().unwrap()).unwrap(),
            json!({"refresh_token": "F1"})
        );
    }

    #[tokio::test]
    async fn test_refresh_missing_field_is_failure() {
        let transport = ScriptedTransport::new();
        transport.on_refresh(|| {
            Ok(ApiResponse::new(
                StatusCode::OK,
                json!({"token": "T2"}).to_string(),
            ))
        });

        let result = request_token_pair(&transport, "F1").await;
        assert!(matches!(result, Err(RefreshFailure::Malformed(_))));
    }

    #[tokio::test]
    async fn test_refresh_rejected() {
        let transport = ScriptedTransport::new();
        transport.on_refresh(|| {
            Ok(ApiResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"message": "Internal server error"}).to_string(),
            ))
        });

        let result = request_token_pair(&transport, "F1").await;
        assert!(matches!(result, Err(RefreshFailure::Rejected { status: 500 })));
    }

    #[tokio::test]
    async fn test_refresh_transport_failure() {
        let transport = ScriptedTransport::new();
        transport.on_refresh(|| Err(ApiError::transport("request timed out")));

        let result = request_token_pair(&transport, "F1").await;
        assert!(matches!(result, Err(RefreshFailure::Transport(_))));
    }
}
