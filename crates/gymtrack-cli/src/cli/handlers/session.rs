//! Sign-in, sign-up and sign-out

use super::build_client;
use crate::error::{CliError, Result};
use crate::output::{print_info, print_success};
use dialoguer::Password;
use gymtrack_sdk::ClientConfig;
use tracing::debug;

fn password_or_prompt(password: Option<String>, confirm: bool) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    let prompt = Password::new().with_prompt("Password");
    let prompt = if confirm {
        prompt.with_confirmation("Confirm password", "Passwords do not match")
    } else {
        prompt
    };
    Ok(prompt.interact()?)
}

/// Handle login command
pub async fn handle_login(
    config: &ClientConfig,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    debug!("Starting login for {}", email);
    let password = password_or_prompt(password, false)?;
    let client = build_client(config)?;

    let user = client
        .sign_in(email, &password)
        .await
        .map_err(|e| CliError::api(e, "Could not sign in. Please try again later."))?;

    print_success(&format!("Signed in as {} <{}>", user.name, user.email));
    Ok(())
}

/// Handle signup command
pub async fn handle_signup(
    config: &ClientConfig,
    name: &str,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = password_or_prompt(password, true)?;
    let client = build_client(config)?;

    client
        .sign_up(name, email, &password)
        .await
        .map_err(|e| CliError::api(e, "Could not create the account. Please try again later."))?;

    print_success("Account created");
    print_info(&format!("Run 'gymtrack login -e {email}' to sign in"));
    Ok(())
}

/// Handle logout command
pub async fn handle_logout(config: &ClientConfig) -> Result<()> {
    let client = build_client(config)?;

    if !client.is_signed_in().await? {
        print_info("Not signed in");
        return Ok(());
    }

    client
        .sign_out()
        .await
        .map_err(|e| CliError::api(e, "Could not remove the stored session"))?;
    print_success("Signed out");
    Ok(())
}
