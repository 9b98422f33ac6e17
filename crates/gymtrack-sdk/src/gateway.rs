//! Authenticated request gateway
//!
//! Wraps a [`Transport`]: attaches the current bearer token, passes successful
//! responses through untouched, hands refreshable 401s to the
//! [`RefreshCoordinator`], and turns every other failure into the SDK's error
//! taxonomy.

use crate::auth::RefreshCoordinator;
use crate::error::{ResponseError, Result};
use crate::transport::{ApiResponse, RequestDescriptor, Transport};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

/// Split a response into success or its classified failure
pub(crate) fn settle_response(
    response: ApiResponse,
) -> std::result::Result<ApiResponse, ResponseError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ResponseError::classify(response.status, &response.body))
    }
}

/// Entry point for every request made on behalf of the signed-in user
#[derive(Clone)]
pub struct RequestGateway {
    transport: Arc<dyn Transport>,
    coordinator: Arc<RefreshCoordinator>,
}

impl std::fmt::Debug for RequestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGateway")
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

impl RequestGateway {
    pub fn new(transport: Arc<dyn Transport>, coordinator: Arc<RefreshCoordinator>) -> Self {
        Self {
            transport,
            coordinator,
        }
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Send `request` with the current credential, recovering once from an
    /// expired or invalid access token.
    pub async fn send(&self, request: RequestDescriptor) -> Result<ApiResponse> {
        let credential = self.coordinator.credential().await?;
        let outbound = match &credential.access_token {
            Some(token) => request.with_bearer(token)?,
            None => request.clone(),
        };

        let response = self.transport.send(&outbound).await?;

        match settle_response(response) {
            Ok(response) => Ok(response),
            Err(ResponseError::Auth(rejection)) if rejection.is_refreshable() => {
                debug!(?rejection, path = %request.path, "Access token rejected, recovering");
                self.coordinator
                    .handle_auth_failure(request, credential.generation)
                    .await
            }
            Err(ResponseError::Auth(rejection)) => {
                self.coordinator
                    .cascade_sign_out("request rejected with a non-refreshable 401");
                Err(ResponseError::Auth(rejection).into_api_error())
            }
            Err(other) => Err(other.into_api_error()),
        }
    }

    /// Send without credentials or recovery; a 401 here is an ordinary server error
    pub async fn send_public(&self, request: RequestDescriptor) -> Result<ApiResponse> {
        let response = self.transport.send(&request).await?;
        settle_response(response).map_err(ResponseError::into_api_error)
    }

    /// [`RequestGateway::send`] and decode the JSON body
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestDescriptor) -> Result<T> {
        self.send(request).await?.json()
    }
}
