//! Interactive questions asked by `foss-cli config`.

use inquire::{Password, PasswordDisplayMode, Select, Text};

use super::DEFAULT_CONFIG_SERVER;
use crate::error::Result;
use crate::models::TokenScope;

/// Answers collected by [`prompt_config`].
#[derive(Debug, Clone)]
pub struct ConfigAnswers {
    pub server: String,
    pub username: String,
    pub password: String,
    pub token_scope: TokenScope,
}

fn server_prompt() -> Text<'static> {
    Text::new("FOSSology URL:")
        .with_default(DEFAULT_CONFIG_SERVER)
        .with_help_message("e.g. http://fossology/repo")
}

fn username_prompt() -> Text<'static> {
    Text::new("Username:").with_help_message("e.g. fossy in the default environment")
}

fn password_prompt() -> Password<'static> {
    Password::new("Password:")
        .with_display_mode(PasswordDisplayMode::Hidden)
        .without_confirmation()
}

fn scope_prompt() -> Select<'static, TokenScope> {
    Select::new("Token scope:", vec![TokenScope::Read, TokenScope::Write])
        .with_help_message("read tokens are limited to GET calls")
}

/// Ask for server, credentials and token scope on the terminal.
///
/// The password is read without echo.
///
/// # Errors
///
/// [`crate::FossologyError::Prompt`] when the terminal is not interactive or
/// the user cancels.
pub fn prompt_config() -> Result<ConfigAnswers> {
    let server = server_prompt().prompt()?;
    let username = username_prompt().prompt()?;
    let password = password_prompt().prompt()?;
    let token_scope = scope_prompt().prompt()?;
    Ok(ConfigAnswers {
        server,
        username,
        password,
        token_scope,
    })
}
