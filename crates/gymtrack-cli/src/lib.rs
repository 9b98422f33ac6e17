//! # GymTrack CLI
//!
//! Command-line client for the GymTrack API, built on `gymtrack-sdk`.
//!
//! The session is persisted in the platform data directory, so a sign-in
//! carries over between invocations. When the session can no longer be
//! refreshed the stored credentials are removed and the user is asked to sign
//! in again.

pub mod cli;
pub mod error;
pub mod output;

pub use cli::*;
pub use error::*;
