//! Partnerships commands - list, inspect and drive the confirmation flow

use anyhow::{Context, Result};
use clap::Subcommand;
use coach_core::{Client, Partnership, User};
use colored::Colorize;
use serde::Serialize;

use super::{get_client, get_password_or_prompt, ListArgs};
use crate::output;

#[derive(Subcommand)]
pub enum PartnershipsCommands {
    /// List partnerships
    List {
        #[command(flatten)]
        args: ListArgs,
    },
    /// Show a partnership and its confirmation state
    Show {
        user1: String,
        user2: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Propose a partnership as the first user
    Propose {
        user1: String,
        user2: String,
        /// Password of the first user
        #[arg(short, long)]
        password: Option<String>,
        /// Visibility of the partnership
        #[arg(long, default_value_t = 2)]
        publicvisible: u8,
    },
    /// Confirm a proposed partnership as the second user
    Confirm {
        user1: String,
        user2: String,
        /// Password of the second user
        #[arg(short, long)]
        password: Option<String>,
        /// Visibility of the partnership
        #[arg(long, default_value_t = 2)]
        publicvisible: u8,
    },
    /// Withdraw the first user's confirmation
    Cancel {
        user1: String,
        user2: String,
        /// Password of the first user
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Withdraw the second user's confirmation
    Invalidate {
        user1: String,
        user2: String,
        /// Password of the second user
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[derive(Serialize)]
struct PartnershipOutput<'a> {
    user1: &'a str,
    user2: &'a str,
    id: Option<u64>,
    publicvisible: Option<u8>,
    datecreated: Option<i64>,
    userconfirmed1: Option<bool>,
    userconfirmed2: Option<bool>,
    operational: Option<bool>,
    subscriptions: &'a [String],
}

pub fn run(command: PartnershipsCommands) -> Result<()> {
    match command {
        PartnershipsCommands::List { args } => list(&args),
        PartnershipsCommands::Show { user1, user2, json } => show(&user1, &user2, json),
        PartnershipsCommands::Propose { user1, user2, password, publicvisible } => {
            let client = get_client()?;
            let password = get_password_or_prompt(password, &user1)?;
            let acting = User::new(&client, user1.as_str()).with_password(password);
            let mut partnership =
                Partnership::new(&client, acting, user2.as_str()).with_publicvisible(publicvisible);
            partnership
                .propose()
                .with_context(|| format!("Failed to propose partnership {}", partnership))?;
            output::success(&format!("Proposed partnership {}", partnership));
            report_state(&partnership);
            Ok(())
        }
        PartnershipsCommands::Confirm { user1, user2, password, publicvisible } => {
            let client = get_client()?;
            let password = get_password_or_prompt(password, &user2)?;
            let acting = User::new(&client, user2.as_str()).with_password(password);
            let mut partnership =
                Partnership::new(&client, user1.as_str(), acting).with_publicvisible(publicvisible);
            partnership
                .confirm()
                .with_context(|| format!("Failed to confirm partnership {}", partnership))?;
            output::success(&format!("Confirmed partnership {}", partnership));
            report_state(&partnership);
            Ok(())
        }
        PartnershipsCommands::Cancel { user1, user2, password } => {
            let client = get_client()?;
            let password = get_password_or_prompt(password, &user1)?;
            let acting = User::new(&client, user1.as_str()).with_password(password);
            let mut partnership = Partnership::new(&client, acting, user2.as_str());
            partnership
                .cancel()
                .with_context(|| format!("Failed to cancel partnership {}", partnership))?;
            output::warning(&format!("Cancelled partnership {}", partnership));
            Ok(())
        }
        PartnershipsCommands::Invalidate { user1, user2, password } => {
            let client = get_client()?;
            let password = get_password_or_prompt(password, &user2)?;
            let acting = User::new(&client, user2.as_str()).with_password(password);
            let mut partnership = Partnership::new(&client, user1.as_str(), acting);
            partnership
                .invalidate()
                .with_context(|| format!("Failed to invalidate partnership {}", partnership))?;
            output::warning(&format!("Invalidated partnership {}", partnership));
            Ok(())
        }
    }
}

fn report_state(partnership: &Partnership) {
    tracing::info!(
        partnership = %partnership,
        user1_confirmed = ?partnership.user1_confirmed(),
        user2_confirmed = ?partnership.user2_confirmed(),
        "partnership state"
    );
    if partnership.operational() == Some(true) {
        output::info("The partnership is now operational");
    }
}

fn list(args: &ListArgs) -> Result<()> {
    let client = get_client()?;
    let spinner = args.all.then(|| output::spinner("Retrieving all partnerships..."));
    let partnerships =
        Partnership::list_where(&client, args.options(), |p| args.keeps(&p.to_string()));
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let partnerships = partnerships.context("Failed to list partnerships")?;
    tracing::debug!(count = partnerships.len(), all = args.all, "partnerships listed");

    if args.json {
        let keys: Vec<String> = partnerships.iter().map(|p| p.to_string()).collect();
        println!("{}", serde_json::to_string_pretty(&keys)?);
        return Ok(());
    }

    if partnerships.is_empty() {
        output::warning("No partnerships found");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["First user", "Second user"]);
    for partnership in &partnerships {
        table.add_row(vec![partnership.user1().username(), partnership.user2().username()]);
    }
    println!("{}", table);
    println!("{} partnerships", partnerships.len());
    Ok(())
}

fn fetch(client: &Client, user1: &str, user2: &str) -> Result<Partnership> {
    client
        .get_partnership(user1, user2)
        .with_context(|| format!("Failed to fetch partnership {};{}", user1, user2))
}

fn show(user1: &str, user2: &str, json: bool) -> Result<()> {
    let client = get_client()?;
    let partnership = fetch(&client, user1, user2)?;
    let subscriptions: Vec<String> = partnership
        .subscriptions()
        .iter()
        .map(|s| s.sport().to_string())
        .collect();

    if json {
        let output = PartnershipOutput {
            user1: partnership.user1().username(),
            user2: partnership.user2().username(),
            id: partnership.id(),
            publicvisible: partnership.publicvisible,
            datecreated: partnership.datecreated(),
            userconfirmed1: partnership.user1_confirmed(),
            userconfirmed2: partnership.user2_confirmed(),
            operational: partnership.operational(),
            subscriptions: &subscriptions,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", partnership.to_string().bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec![
        format!("Confirmed by {}", partnership.user1()),
        output::format_flag(partnership.user1_confirmed()),
    ]);
    table.add_row(vec![
        format!("Confirmed by {}", partnership.user2()),
        output::format_flag(partnership.user2_confirmed()),
    ]);
    table.add_row(vec!["Visibility".to_string(), output::or_dash(partnership.publicvisible)]);
    table.add_row(vec!["Created".to_string(), output::format_timestamp(partnership.datecreated())]);
    println!("{}", table);

    if !subscriptions.is_empty() {
        println!();
        println!("{}", "Subscriptions".bold());
        for sport in &subscriptions {
            println!("  • {}", sport);
        }
    }
    Ok(())
}
