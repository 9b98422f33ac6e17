//! Type definitions for the GymTrack API

use crate::auth::TokenPair;
use serde::{Deserialize, Serialize};

/// Signed-in user profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Avatar file name, when one was uploaded
    #[serde(default)]
    pub avatar: Option<String>,
}

/// `POST /sessions` body
#[derive(Debug, Clone, Serialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// `POST /sessions` response
#[derive(Clone, Deserialize)]
pub struct SessionResponse {
    pub user: User,
    pub token: String,
    pub refresh_token: String,
}

impl SessionResponse {
    pub fn token_pair(&self) -> TokenPair {
        TokenPair::new(self.token.clone(), self.refresh_token.clone())
    }
}

impl std::fmt::Debug for SessionResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionResponse")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// `POST /users` body
#[derive(Debug, Clone, Serialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// `PUT /users` body.
///
/// Changing the password requires the current one in `old_password`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_password: Option<String>,
}

/// Exercise as listed for a muscle group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: u64,
    pub name: String,
    pub series: u32,
    pub repetitions: u32,
    pub group: String,
    /// Demonstration file name
    #[serde(default)]
    pub demo: Option<String>,
    /// Thumbnail file name
    #[serde(default)]
    pub thumb: Option<String>,
}
