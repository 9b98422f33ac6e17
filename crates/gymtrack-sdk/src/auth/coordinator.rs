//! Single-flight token refresh with queued replay
//!
//! The first request rejected with a refreshable 401 while the coordinator is
//! [`RefreshState::Idle`] leads the refresh. Requests rejected while a refresh is in
//! flight are parked in a FIFO queue and resolved once it settles:
//!
//! - success: the new pair is persisted, the cached access token replaced, the queue
//!   taken, and every waiter replayed in arrival order with the new token before the
//!   leading request is replayed
//! - failure: the application is signed out once and every waiter, plus the leader,
//!   fails with [`ApiError::AuthExpired`]
//! - superseded: the session was ended or replaced while the call was outstanding;
//!   the new pair is discarded and everyone fails with [`ApiError::AuthExpired`]
//!   without a second sign-out
//!
//! The state lock guards transitions and queue mutation only. It is never held
//! across the refresh call, so new waiters can join while it is outstanding.
//! Store writes that change the session are serialized by a separate async lock.

use super::refresh::{request_token_pair, RefreshFailure};
use super::store::{CredentialStore, StoreError};
use super::types::TokenPair;
use crate::error::{ApiError, ResponseError, Result};
use crate::gateway::settle_response;
use crate::transport::{ApiResponse, RequestDescriptor, Transport};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Application callback run when the session cannot be recovered
pub type SignOutHandle = Arc<dyn Fn() + Send + Sync>;

/// Whether a refresh call is currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// The access token to present and the credential generation it belongs to.
///
/// The generation advances whenever the cached credential changes, which lets a
/// late 401 for an already-replaced token be told apart from a fresh expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialSnapshot {
    pub access_token: Option<String>,
    pub generation: u64,
}

impl fmt::Debug for CredentialSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSnapshot")
            .field("has_access_token", &self.access_token.is_some())
            .field("generation", &self.generation)
            .finish()
    }
}

/// A request waiting on the in-flight refresh
struct PendingRequest {
    request: RequestDescriptor,
    reply: oneshot::Sender<Result<ApiResponse>>,
}

struct CoordinatorState {
    refresh: RefreshState,
    access_token: Option<String>,
    generation: u64,
    primed: bool,
    waiters: VecDeque<PendingRequest>,
}

impl CoordinatorState {
    fn snapshot(&self) -> CredentialSnapshot {
        CredentialSnapshot {
            access_token: self.access_token.clone(),
            generation: self.generation,
        }
    }

    fn replace_token(&mut self, token: Option<String>) {
        self.access_token = token;
        self.generation += 1;
        self.primed = true;
    }
}

/// Why a refresh attempt ended without a usable pair
#[derive(Debug, Error)]
enum SettleFailure {
    #[error("no refresh token stored")]
    NoRefreshToken,

    #[error("could not read stored session: {0}")]
    StoreRead(StoreError),

    #[error(transparent)]
    Refresh(#[from] RefreshFailure),

    #[error("could not persist refreshed session: {0}")]
    StoreWrite(StoreError),

    #[error("session changed while refreshing")]
    Superseded,
}

/// How a rejected request proceeds once the state lock is released
enum Entry {
    Lead,
    Wait(oneshot::Receiver<Result<ApiResponse>>),
    Replay(String),
    SignedOut,
}

/// Returns the coordinator to Idle if a refresh unwinds before settling
struct RefreshGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    armed: bool,
}

impl RefreshGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let waiters = self.coordinator.finish_refresh();
        error!(waiters = waiters.len(), "Refresh aborted, failing queued requests");
        fail_all(waiters);
    }
}

fn fail_all(waiters: VecDeque<PendingRequest>) {
    for waiter in waiters {
        let _ = waiter.reply.send(Err(ApiError::AuthExpired));
    }
}

/// Owns the in-memory credential, the refresh state machine and the waiter queue
pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    sign_out: Option<SignOutHandle>,
    state: Mutex<CoordinatorState>,
    session_writes: tokio::sync::Mutex<()>,
}

impl fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RefreshCoordinator")
            .field("refresh", &state.refresh)
            .field("generation", &state.generation)
            .field("waiters", &state.waiters.len())
            .finish()
    }
}

impl RefreshCoordinator {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        sign_out: Option<SignOutHandle>,
    ) -> Self {
        Self {
            transport,
            store,
            sign_out,
            state: Mutex::new(CoordinatorState {
                refresh: RefreshState::Idle,
                access_token: None,
                generation: 0,
                primed: false,
                waiters: VecDeque::new(),
            }),
            session_writes: tokio::sync::Mutex::new(()),
        }
    }

    /// Seed the cached access token without touching the store
    pub fn with_access_token(self, token: impl Into<String>) -> Self {
        self.state.lock().replace_token(Some(token.into()));
        self
    }

    pub fn state(&self) -> RefreshState {
        self.state.lock().refresh
    }

    /// Number of requests parked behind the in-flight refresh
    pub fn waiting(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Current credential, loading it from the store on first use
    pub async fn credential(&self) -> Result<CredentialSnapshot> {
        {
            let state = self.state.lock();
            if state.primed {
                return Ok(state.snapshot());
            }
        }

        let stored = self.store.get().await?;

        let mut state = self.state.lock();
        if !state.primed {
            debug!(found = stored.is_some(), "Loaded session from credential store");
            state.replace_token(stored.map(|pair| pair.token));
        }
        Ok(state.snapshot())
    }

    /// Persist `pair` and start presenting its access token
    pub async fn install(&self, pair: TokenPair) -> Result<()> {
        let _writes = self.session_writes.lock().await;
        self.store.save(&pair).await?;
        self.state.lock().replace_token(Some(pair.token));
        info!("Session credentials installed");
        Ok(())
    }

    /// Stop presenting any access token. The store is left untouched.
    pub fn forget(&self) {
        self.state.lock().replace_token(None);
    }

    /// Explicit sign-out: forget the access token and clear the store.
    ///
    /// A refresh still in flight is discarded when it returns.
    pub async fn end_session(&self) -> Result<()> {
        let _writes = self.session_writes.lock().await;
        self.forget();
        self.store.clear().await?;
        info!("Session ended");
        Ok(())
    }

    /// Recover from a refreshable authentication failure.
    ///
    /// `sent_generation` is the generation of the credential `request` was sent
    /// with. The returned result is the replayed response, or the terminal error
    /// for this request.
    pub async fn handle_auth_failure(
        self: &Arc<Self>,
        request: RequestDescriptor,
        sent_generation: u64,
    ) -> Result<ApiResponse> {
        let entry = {
            let mut state = self.state.lock();
            let current = state.refresh;
            match current {
                RefreshState::Refreshing => {
                    let (reply, receiver) = oneshot::channel();
                    state.waiters.push_back(PendingRequest {
                        request: request.clone(),
                        reply,
                    });
                    debug!(waiters = state.waiters.len(), "Queued request behind refresh");
                    Entry::Wait(receiver)
                }
                RefreshState::Idle if state.generation != sent_generation => {
                    match &state.access_token {
                        Some(token) => Entry::Replay(token.clone()),
                        None => Entry::SignedOut,
                    }
                }
                RefreshState::Idle => {
                    state.refresh = RefreshState::Refreshing;
                    Entry::Lead
                }
            }
        };

        match entry {
            Entry::Wait(receiver) => receiver.await.unwrap_or(Err(ApiError::AuthExpired)),
            Entry::Replay(token) => {
                debug!("Credential already replaced since request was sent, replaying");
                self.replay(&request, &token).await
            }
            Entry::SignedOut => Err(ApiError::AuthExpired),
            Entry::Lead => {
                // Detached so a dropped leader cannot strand the waiters
                let settle = tokio::spawn(Arc::clone(self).settle(sent_generation));
                match settle.await {
                    Ok(Some(token)) => self.replay(&request, &token).await,
                    Ok(None) => Err(ApiError::AuthExpired),
                    Err(e) => {
                        error!("Refresh task failed: {}", e);
                        Err(ApiError::AuthExpired)
                    }
                }
            }
        }
    }

    /// Run the cascade for an unrecoverable session
    pub(crate) fn cascade_sign_out(&self, reason: &str) {
        warn!(reason, "Signing out");
        self.forget();
        if let Some(sign_out) = &self.sign_out {
            if catch_unwind(AssertUnwindSafe(|| sign_out())).is_err() {
                error!("Sign-out handler panicked");
            }
        }
    }

    fn finish_refresh(&self) -> VecDeque<PendingRequest> {
        let mut state = self.state.lock();
        state.refresh = RefreshState::Idle;
        std::mem::take(&mut state.waiters)
    }

    /// Perform the refresh and resolve every waiter. Returns the new access token.
    ///
    /// `started` is the credential generation the refresh was started for.
    async fn settle(self: Arc<Self>, started: u64) -> Option<String> {
        let mut guard = RefreshGuard {
            coordinator: self.as_ref(),
            armed: true,
        };

        match self.refresh_pair(started).await {
            Ok((pair, waiters)) => {
                guard.disarm();
                info!(waiters = waiters.len(), "Refresh succeeded, replaying queued requests");
                for waiter in waiters {
                    let result = self.replay(&waiter.request, &pair.token).await;
                    let _ = waiter.reply.send(result);
                }
                Some(pair.token)
            }
            Err(SettleFailure::Superseded) => {
                let waiters = self.finish_refresh();
                guard.disarm();
                info!(
                    waiters = waiters.len(),
                    "Session changed during refresh, discarding refreshed pair"
                );
                fail_all(waiters);
                None
            }
            Err(failure) => {
                self.cascade_sign_out(&failure.to_string());
                let waiters = self.finish_refresh();
                guard.disarm();
                warn!(waiters = waiters.len(), "Refresh failed, failing queued requests");
                fail_all(waiters);
                None
            }
        }
    }

    /// Obtain, persist and install a new pair. On success the coordinator is
    /// already Idle and the returned queue is owned by the caller.
    async fn refresh_pair(
        &self,
        started: u64,
    ) -> std::result::Result<(TokenPair, VecDeque<PendingRequest>), SettleFailure> {
        let current = self
            .store
            .get()
            .await
            .map_err(SettleFailure::StoreRead)?
            .ok_or(SettleFailure::NoRefreshToken)?;

        let pair = request_token_pair(self.transport.as_ref(), &current.refresh_token).await?;

        let _writes = self.session_writes.lock().await;
        let superseded = self.state.lock().generation != started;
        if superseded {
            return Err(SettleFailure::Superseded);
        }

        // Durable before anything observes the new token
        self.store
            .save(&pair)
            .await
            .map_err(SettleFailure::StoreWrite)?;

        let waiters = {
            let mut state = self.state.lock();
            if state.generation == started {
                state.replace_token(Some(pair.token.clone()));
                state.refresh = RefreshState::Idle;
                Some(std::mem::take(&mut state.waiters))
            } else {
                None
            }
        };

        match waiters {
            Some(waiters) => Ok((pair, waiters)),
            None => {
                // Forgotten during the save; the pair must not outlive the session
                if let Err(e) = self.store.clear().await {
                    warn!("Failed to discard refreshed session: {}", e);
                }
                Err(SettleFailure::Superseded)
            }
        }
    }

    /// Re-issue `request` with `token`. A second rejection is terminal.
    async fn replay(&self, request: &RequestDescriptor, token: &str) -> Result<ApiResponse> {
        let request = request.with_bearer(token)?;
        let response = self.transport.send(&request).await?;
        match settle_response(response) {
            Ok(response) => Ok(response),
            Err(ResponseError::Auth(rejection)) => {
                warn!(?rejection, path = %request.path, "Replayed request rejected again");
                Err(ApiError::AuthExpired)
            }
            Err(other) => Err(other.into_api_error()),
        }
    }
}
