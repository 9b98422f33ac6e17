//! Profile updates

use super::build_client;
use crate::error::{CliError, Result};
use crate::output::print_success;
use dialoguer::Password;
use gymtrack_sdk::{ClientConfig, UpdateProfileRequest};

/// Current and new password, in that order
pub type PasswordChange = (String, String);

/// Ask for the current password and a confirmed new one
pub fn prompt_password_change() -> Result<PasswordChange> {
    let old_password = Password::new().with_prompt("Current password").interact()?;
    let new_password = Password::new()
        .with_prompt("New password")
        .with_confirmation("Confirm new password", "Passwords do not match")
        .interact()?;
    Ok((old_password, new_password))
}

/// Handle profile update command
pub async fn handle_update(
    config: &ClientConfig,
    name: &str,
    passwords: Option<PasswordChange>,
) -> Result<()> {
    let (old_password, password) = match passwords {
        Some((old, new)) => (Some(old), Some(new)),
        None => (None, None),
    };
    let request = UpdateProfileRequest {
        name: name.to_string(),
        password,
        old_password,
    };

    let client = build_client(config)?;
    client
        .update_profile(&request)
        .await
        .map_err(|e| CliError::api(e, "Could not update the profile. Please try again later."))?;

    print_success("Profile updated");
    Ok(())
}
