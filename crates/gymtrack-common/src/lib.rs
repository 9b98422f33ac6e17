//! # GymTrack Common
//!
//! Shared ambient utilities for the GymTrack workspace:
//! - Logging initialization for binaries
//! - The configuration loading contract used by every crate

pub mod config;
pub mod logging;

pub use config::{ConfigLoader, ConfigurationError};
