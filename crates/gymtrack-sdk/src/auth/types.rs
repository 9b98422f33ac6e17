//! Authentication-related types

use serde::{Deserialize, Serialize};
use std::fmt;

/// The current access token and the refresh token it was issued with.
///
/// Field names match the wire format of the sessions endpoints. A pair is always
/// replaced as a whole, never field by field.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer credential
    pub token: String,
    /// Longer-lived credential exchanged for a new pair
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

// Keep credentials out of logs and panic messages
impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}
