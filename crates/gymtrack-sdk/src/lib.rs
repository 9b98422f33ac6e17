//! # GymTrack SDK
//!
//! Authenticated HTTP access to the GymTrack API.
//!
//! ## Features
//!
//! - **Bearer authentication**: every request carries the current access token
//! - **Single-flight refresh**: concurrent requests rejected with an expired token
//!   share one refresh call and are replayed in arrival order
//! - **Sign-out cascade**: an unrecoverable session signs the application out once
//! - **Closed error taxonomy**: callers only see transport, server and
//!   session-expired failures
//! - **Pluggable storage**: in-memory or file-backed session persistence

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use auth::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, RefreshCoordinator,
    RefreshState, SignOutHandle, StoreError, TokenPair,
};
pub use client::{ClientBuilder, GymClient};
pub use config::ClientConfig;
pub use error::{ApiError, Result};
pub use gateway::RequestGateway;
pub use transport::{ApiResponse, HttpTransport, RequestDescriptor, Transport};
pub use types::{CreateUserRequest, Exercise, SessionResponse, UpdateProfileRequest, User};

/// Version of the gymtrack-sdk crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
