//! Users commands - list and inspect users

use anyhow::{Context, Result};
use clap::Subcommand;
use coach_core::User;
use colored::Colorize;
use serde::Serialize;

use super::{get_client, ListArgs};
use crate::output;

#[derive(Subcommand)]
pub enum UsersCommands {
    /// List users
    List {
        #[command(flatten)]
        args: ListArgs,
    },
    /// Show a user with its partnerships and subscriptions
    Show {
        username: String,
        /// Read as this user's own identity (shows private details)
        #[arg(short, long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct UserOutput<'a> {
    username: &'a str,
    realname: Option<&'a str>,
    email: Option<&'a str>,
    publicvisible: Option<u8>,
    datecreated: Option<i64>,
    partnerships: &'a [String],
    subscriptions: &'a [String],
}

pub fn run(command: UsersCommands) -> Result<()> {
    match command {
        UsersCommands::List { args } => list(&args),
        UsersCommands::Show { username, password, json } => show(&username, password, json),
    }
}

fn list(args: &ListArgs) -> Result<()> {
    let client = get_client()?;
    let spinner = args.all.then(|| output::spinner("Retrieving all users..."));
    let users = User::list_where(&client, args.options(), |u| args.keeps(u.username()));
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let users = users.context("Failed to list users")?;
    tracing::debug!(count = users.len(), all = args.all, "users listed");

    if args.json {
        let names: Vec<&str> = users.iter().map(User::username).collect();
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }

    if users.is_empty() {
        output::warning("No users found");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Username"]);
    for user in &users {
        table.add_row(vec![user.username()]);
    }
    println!("{}", table);
    println!("{} users", users.len());
    Ok(())
}

fn show(username: &str, password: Option<String>, json: bool) -> Result<()> {
    let client = get_client()?;
    let mut user = User::new(&client, username);
    if let Some(password) = password {
        user = user.with_password(password);
    }
    user.update()
        .with_context(|| format!("Failed to fetch user '{}'", username))?;

    let partnerships: Vec<String> = user.partnerships().iter().map(|p| p.to_string()).collect();
    let subscriptions: Vec<String> = user
        .subscriptions()
        .iter()
        .map(|s| s.sport().to_string())
        .collect();

    if json {
        let output = UserOutput {
            username: user.username(),
            realname: user.realname.as_deref(),
            email: user.email.as_deref(),
            publicvisible: user.publicvisible,
            datecreated: user.datecreated(),
            partnerships: &partnerships,
            subscriptions: &subscriptions,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", user.username().bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Real name".to_string(), output::or_dash(user.realname.as_deref())]);
    table.add_row(vec!["Email".to_string(), output::or_dash(user.email.as_deref())]);
    table.add_row(vec!["Visibility".to_string(), output::or_dash(user.publicvisible)]);
    table.add_row(vec!["Created".to_string(), output::format_timestamp(user.datecreated())]);
    println!("{}", table);
    println!();

    if !partnerships.is_empty() {
        println!("{}", "Partnerships".bold());
        for partnership in &partnerships {
            println!("  • {}", partnership);
        }
    }
    if !subscriptions.is_empty() {
        println!("{}", "Subscriptions".bold());
        for sport in &subscriptions {
            println!("  • {}", sport);
        }
    }
    Ok(())
}
