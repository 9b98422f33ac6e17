//! Scripted collaborators for deterministic unit tests

use crate::auth::refresh::REFRESH_PATH;
use crate::auth::{CredentialStore, MemoryCredentialStore, SignOutHandle, StoreError, TokenPair};
use crate::error::{ApiError, Result};
use crate::transport::{ApiResponse, RequestDescriptor, Transport};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

type RefreshResponder = Arc<dyn Fn() -> Result<ApiResponse> + Send + Sync>;
type RouteResponder = Arc<dyn Fn(&RequestDescriptor) -> Result<ApiResponse> + Send + Sync>;

/// Transport that answers from a script and records every request in send order.
///
/// Unless a route is scripted, a request succeeds when its bearer token has been
/// accepted and fails with `401 token.expired` otherwise. The refresh endpoint
/// answers 500 until scripted, and can be held until the test releases it.
#[derive(Default)]
pub struct ScriptedTransport {
    log: Mutex<Vec<RequestDescriptor>>,
    accepted: Mutex<HashSet<String>>,
    routes: Mutex<HashMap<String, RouteResponder>>,
    refresh: Mutex<Option<RefreshResponder>>,
    refresh_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept_token(&self, token: &str) {
        self.accepted.lock().insert(token.to_string());
    }

    pub fn on_refresh<F>(&self, responder: F)
    where
        F: Fn() -> Result<ApiResponse> + Send + Sync + 'static,
    {
        *self.refresh.lock() = Some(Arc::new(responder));
    }

    /// Refresh succeeds with `{token, refresh_token}`
    pub fn refresh_returns(&self, token: &'static str, refresh_token: &'static str) {
        self.on_refresh(move || {
            Ok(ApiResponse::new(
                StatusCode::OK,
                json!({ "token": token, "refresh_token": refresh_token }).to_string(),
            ))
        });
    }

    pub fn on_path<F>(&self, path: &str, responder: F)
    where
        F: Fn(&RequestDescriptor) -> Result<ApiResponse> + Send + Sync + 'static,
    {
        self.routes.lock().insert(path.to_string(), Arc::new(responder));
    }

    /// Block refresh calls until [`ScriptedTransport::release_refresh`]
    pub fn hold_refresh(&self) {
        *self.refresh_gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_refresh(&self) {
        if let Some(gate) = self.refresh_gate.lock().as_ref() {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.log.lock().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RequestDescriptor> {
        self.log
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<ApiResponse> {
        self.log.lock().push(request.clone());

        if request.path == REFRESH_PATH {
            let gate = self.refresh_gate.lock().clone();
            if let Some(gate) = gate {
                let permit = gate
                    .acquire()
                    .await
                    .map_err(|_| ApiError::transport("refresh gate closed"))?;
                permit.forget();
            }
            let responder = self.refresh.lock().clone();
            return match responder {
                Some(responder) => responder(),
                None => Ok(ApiResponse::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "refresh not scripted" }).to_string(),
                )),
            };
        }

        let route = self.routes.lock().get(&request.path).cloned();
        if let Some(route) = route {
            return route(request);
        }

        let authorised = request
            .bearer()
            .map(|token| self.accepted.lock().contains(token))
            .unwrap_or(false);
        if authorised {
            Ok(ApiResponse::new(
                StatusCode::OK,
                json!({ "path": request.path, "token": request.bearer() }).to_string(),
            ))
        } else {
            Ok(ApiResponse::new(
                StatusCode::UNAUTHORIZED,
                json!({ "message": "token.expired" }).to_string(),
            ))
        }
    }
}

/// Store that records every save and can be told to fail them
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryCredentialStore,
    saves: Mutex<Vec<TokenPair>>,
    fail_saves: AtomicBool,
}

impl RecordingStore {
    pub fn with_pair(pair: TokenPair) -> Self {
        Self {
            inner: MemoryCredentialStore::with_pair(pair),
            ..Default::default()
        }
    }

    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }

    pub fn saves(&self) -> Vec<TokenPair> {
        self.saves.lock().clone()
    }
}

#[async_trait]
impl CredentialStore for RecordingStore {
    async fn get(&self) -> std::result::Result<Option<TokenPair>, StoreError> {
        self.inner.get().await
    }

    async fn save(&self, pair: &TokenPair) -> std::result::Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only storage",
            )));
        }
        self.saves.lock().push(pair.clone());
        self.inner.save(pair).await
    }

    async fn clear(&self) -> std::result::Result<(), StoreError> {
        self.inner.clear().await
    }
}

/// Sign-out handle that counts its invocations
pub fn counting_sign_out() -> (SignOutHandle, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let handle: SignOutHandle = Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (handle, count)
}
