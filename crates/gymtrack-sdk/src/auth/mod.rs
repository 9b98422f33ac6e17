//! Session credentials and their recovery
//!
//! This module provides:
//! - The access/refresh token pair and its durable storage
//! - The call to the refresh endpoint
//! - The single-flight refresh coordinator that queues and replays requests
//!   blocked on an expired access token

pub mod coordinator;
pub mod refresh;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use coordinator::{CredentialSnapshot, RefreshCoordinator, RefreshState, SignOutHandle};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StoreError};
pub use types::TokenPair;
