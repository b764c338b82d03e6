//! Auth command - check the credentials of a user

use anyhow::Result;
use coach_core::User;
use colored::Colorize;
use serde::Serialize;

use super::{get_client, get_password_or_prompt};

#[derive(Serialize)]
struct AuthOutput<'a> {
    username: &'a str,
    authenticated: bool,
}

pub fn run(username: &str, password: Option<String>, json: bool) -> Result<()> {
    let client = get_client()?;
    let password = get_password_or_prompt(password, username)?;
    let user = User::new(&client, username).with_password(password);
    let authenticated = user.authenticated()?;
    tracing::debug!(username, authenticated, "checked credentials");

    if json {
        let output = AuthOutput { username, authenticated };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if authenticated {
        println!("{} {}", "Authenticated:".green(), username);
    } else {
        println!("{} {}", "Not authenticated:".red(), username);
    }
    Ok(())
}
