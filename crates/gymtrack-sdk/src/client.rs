//! HTTP client for the GymTrack API
//!
//! [`GymClient`] exposes the typed endpoints and routes every authenticated call
//! through the [`RequestGateway`], so an expired access token is refreshed once
//! and the affected requests replayed without the caller noticing.
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use gymtrack_sdk::ClientBuilder;
//! use std::sync::Arc;
//!
//! # async fn example() -> gymtrack_sdk::Result<()> {
//! // Persisted session under the platform data directory
//! let client = ClientBuilder::default()
//!     .base_url("http://localhost:3333")
//!     .with_file_store()
//!     .on_sign_out(Arc::new(|| eprintln!("Session expired, please sign in again")))
//!     .build()?;
//!
//! client.sign_in("ana@example.com", "secret").await?;
//! let groups = client.groups().await?;
//! # Ok(())
//! # }
//! ```

use crate::{
    auth::{
        CredentialStore, FileCredentialStore, MemoryCredentialStore, RefreshCoordinator,
        SignOutHandle, TokenPair,
    },
    config::ClientConfig,
    error::{ApiError, Result},
    gateway::RequestGateway,
    transport::{ApiResponse, HttpTransport, HttpTransportOptions, RequestDescriptor, Transport},
    types::{CreateUserRequest, Exercise, SessionResponse, SignInRequest, UpdateProfileRequest, User},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Default API URL when not specified
pub const DEFAULT_API_URL: &str = "http://localhost:3333";

/// Default timeout in seconds for API requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 6;

/// HTTP client for interacting with the GymTrack API
#[derive(Clone, Debug)]
pub struct GymClient {
    gateway: RequestGateway,
}

impl GymClient {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The gateway every authenticated request goes through
    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    /// Whether an access token is currently held
    pub async fn is_signed_in(&self) -> Result<bool> {
        let credential = self.gateway.coordinator().credential().await?;
        Ok(credential.access_token.is_some())
    }

    // ===== Session =====

    /// Sign in with e-mail and password and install the returned session
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        let request = RequestDescriptor::post_json(
            "/sessions",
            &SignInRequest {
                email: email.to_string(),
                password: password.to_string(),
            },
        )?;
        let session: SessionResponse = self.gateway.send_public(request).await?.json()?;

        self.gateway
            .coordinator()
            .install(session.token_pair())
            .await?;
        info!(user_id = %session.user.id, "Signed in");
        Ok(session.user)
    }

    /// Create an account. Does not sign in.
    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<()> {
        let request = RequestDescriptor::post_json(
            "/users",
            &CreateUserRequest {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            },
        )?;
        self.gateway.send_public(request).await?;
        Ok(())
    }

    /// Explicit sign-out: drop the cached token and the stored session.
    /// A refresh still in flight is discarded rather than reinstated.
    pub async fn sign_out(&self) -> Result<()> {
        self.gateway.coordinator().end_session().await
    }

    // ===== Exercises =====

    /// List muscle groups
    pub async fn groups(&self) -> Result<Vec<String>> {
        self.gateway.send_json(RequestDescriptor::get("/groups")).await
    }

    /// List the exercises of a muscle group
    pub async fn exercises_by_group(&self, group: &str) -> Result<Vec<Exercise>> {
        let path = format!("/exercises/bygroup/{}", urlencoding::encode(group));
        self.gateway.send_json(RequestDescriptor::get(path)).await
    }

    /// Get a single exercise
    pub async fn exercise(&self, id: u64) -> Result<Exercise> {
        let path = format!("/exercises/{id}");
        self.gateway.send_json(RequestDescriptor::get(path)).await
    }

    // ===== Profile =====

    /// Update the signed-in user's name and, optionally, password
    pub async fn update_profile(&self, request: &UpdateProfileRequest) -> Result<()> {
        if request.password.is_some() && request.old_password.is_none() {
            return Err(ApiError::InvalidRequest {
                message: "Changing the password requires the current password".into(),
            });
        }
        self.gateway
            .send(RequestDescriptor::put_json("/users", request)?)
            .await?;
        Ok(())
    }

    /// Send any other authenticated request
    pub async fn send(&self, request: RequestDescriptor) -> Result<ApiResponse> {
        self.gateway.send(request).await
    }
}

/// Builder for constructing a GymClient with custom configuration
#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_max_idle_per_host: Option<usize>,
    tokens: Option<TokenPair>,
    store: Option<Arc<dyn CredentialStore>>,
    file_store_dir: Option<Option<PathBuf>>,
    sign_out: Option<SignOutHandle>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder preloaded from a [`ClientConfig`], persisting the session on disk
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut builder = Self::new()
            .base_url(config.api.base_url.clone())
            .timeout(config.timeout());
        if let Some(connect_timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(max) = config.api.pool_max_idle_per_host {
            builder = builder.pool_max_idle_per_host(max);
        }
        builder.file_store_dir = Some(config.storage.data_dir.clone());
        builder
    }

    /// Set the base URL for the API
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = Some(max);
        self
    }

    /// Start from a known token pair, held in memory only
    pub fn with_tokens(
        mut self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        self.tokens = Some(TokenPair::new(access_token, refresh_token));
        self.store = None;
        self.file_store_dir = None;
        self
    }

    /// Persist the session through `store`
    pub fn with_credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self.tokens = None;
        self.file_store_dir = None;
        self
    }

    /// Persist the session under the platform data directory
    pub fn with_file_store(mut self) -> Self {
        self.file_store_dir = Some(None);
        self.tokens = None;
        self.store = None;
        self
    }

    /// Called once whenever the session cannot be recovered
    pub fn on_sign_out(mut self, handle: SignOutHandle) -> Self {
        self.sign_out = Some(handle);
        self
    }

    /// Replace the HTTP transport; connection settings are then ignored
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<GymClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let base_url = self.base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
                let options = HttpTransportOptions {
                    timeout: self
                        .timeout
                        .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
                    connect_timeout: self.connect_timeout,
                    pool_max_idle_per_host: self.pool_max_idle_per_host,
                };
                Arc::new(HttpTransport::new(&base_url, options)?)
            }
        };

        let access_token = self.tokens.as_ref().map(|pair| pair.token.clone());
        let store: Arc<dyn CredentialStore> = if let Some(pair) = self.tokens {
            Arc::new(MemoryCredentialStore::with_pair(pair))
        } else if let Some(store) = self.store {
            store
        } else if let Some(dir) = self.file_store_dir {
            match dir {
                Some(dir) => Arc::new(FileCredentialStore::new(dir)),
                None => Arc::new(FileCredentialStore::in_default_dir()?),
            }
        } else {
            return Err(ApiError::InvalidRequest {
                message: "Either use with_tokens(), with_credential_store() or with_file_store()"
                    .into(),
            });
        };

        let mut coordinator =
            RefreshCoordinator::new(Arc::clone(&transport), store, self.sign_out);
        if let Some(token) = access_token {
            coordinator = coordinator.with_access_token(token);
        }

        Ok(GymClient {
            gateway: RequestGateway::new(transport, Arc::new(coordinator)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::counting_sign_out;
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_body(token: &str, refresh_token: &str) -> serde_json::Value {
        json!({
            "user": {"id": "u-1", "name": "Ana", "email": "ana@example.com", "avatar": null},
            "token": token,
            "refresh_token": refresh_token,
        })
    }

    #[tokio::test]
    async fn test_sign_in_installs_session() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/sessions"))
            .and(body_json(json!({"email": "ana@example.com", "password": "secret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body("T1", "F1")))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/groups"))
            .and(header("Authorization", "Bearer T1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["costas", "ombro"])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let store = Arc::new(MemoryCredentialStore::new());
        let client = ClientBuilder::default()
            .base_url(mock_server.uri())
            .with_credential_store(store.clone())
            .build()
            .unwrap();
        assert!(!client.is_signed_in().await.unwrap());

        let user = client.sign_in("ana@example.com", "secret").await.unwrap();
        assert_eq!(user.name, "Ana");
        assert!(client.is_signed_in().await.unwrap());
        assert_eq!(store.get().await.unwrap(), Some(TokenPair::new("T1", "F1")));

        let groups = client.groups().await.unwrap();
        assert_eq!(groups, vec!["costas", "ombro"]);
    }

    #[tokio::test]
    async fn test_wrong_password_is_server_error_without_sign_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/sessions"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"message": "Incorrect e-mail or password."})),
            )
            .mount(&mock_server)
            .await;

        let (sign_out, sign_outs) = counting_sign_out();
        let client = ClientBuilder::default()
            .base_url(mock_server.uri())
            .with_credential_store(Arc::new(MemoryCredentialStore::new()))
            .on_sign_out(sign_out)
            .build()
            .unwrap();

        let err = client.sign_in("ana@example.com", "wrong").await.unwrap_err();
        assert_eq!(
            err.display_message("Could not sign in"),
            "Incorrect e-mail or password."
        );
        assert_eq!(sign_outs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sign_out_clears_store_and_cache() {
        let mock_server = MockServer::start().await;

        let store = Arc::new(MemoryCredentialStore::with_pair(TokenPair::new("T1", "F1")));
        let client = ClientBuilder::default()
            .base_url(mock_server.uri())
            .with_credential_store(store.clone())
            .build()
            .unwrap();
        assert!(client.is_signed_in().await.unwrap());

        client.sign_out().await.unwrap();
        assert!(!client.is_signed_in().await.unwrap());
        assert_eq!(store.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_exercise_endpoints() {
        let mock_server = MockServer::start().await;
        let exercise = json!({
            "id": 3,
            "name": "Remada unilateral",
            "series": 3,
            "repetitions": 12,
            "group": "costas",
            "demo": "remada.gif",
            "thumb": "remada.png",
        });

        Mock::given(method("GET"))
            .and(path("/exercises/bygroup/costas"))
            .and(header("Authorization", "Bearer T1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([exercise.clone()])))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/exercises/3"))
            .and(header("Authorization", "Bearer T1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(exercise))
            .mount(&mock_server)
            .await;

        let client = ClientBuilder::default()
            .base_url(mock_server.uri())
            .with_tokens("T1", "F1")
            .build()
            .unwrap();

        let listed = client.exercises_by_group("costas").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].repetitions, 12);

        let single = client.exercise(3).await.unwrap();
        assert_eq!(single, listed[0]);
    }

    #[tokio::test]
    async fn test_update_profile() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/users"))
            .and(header("Authorization", "Bearer T1"))
            .and(body_json(json!({"name": "Ana Maria", "password": "new", "old_password": "old"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ClientBuilder::default()
            .base_url(mock_server.uri())
            .with_tokens("T1", "F1")
            .build()
            .unwrap();

        client
            .update_profile(&UpdateProfileRequest {
                name: "Ana Maria".into(),
                password: Some("new".into()),
                old_password: Some("old".into()),
            })
            .await
            .unwrap();

        let missing_old = client
            .update_profile(&UpdateProfileRequest {
                name: "Ana Maria".into(),
                password: Some("new".into()),
                old_password: None,
            })
            .await;
        assert!(matches!(missing_old, Err(ApiError::InvalidRequest { .. })));
    }

    #[test]
    fn test_build_requires_credential_source() {
        let result = ClientBuilder::default().build();
        assert!(matches!(result, Err(ApiError::InvalidRequest { .. })));
    }

    #[test]
    fn test_from_config_uses_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ClientConfig::default();
        config.api.base_url = "http://localhost:4000".into();
        config.storage.data_dir = Some(dir.path().to_path_buf());

        let client = ClientBuilder::from_config(&config).build();
        assert!(client.is_ok());
    }
}
