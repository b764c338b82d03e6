//! Entries commands - inspect logged activities

use anyhow::{Context, Result};
use clap::Subcommand;
use coach_core::{Entry, SportDetails, SportKind, Subscription, User};
use colored::Colorize;
use serde::Serialize;

use super::get_client;
use crate::output;

#[derive(Subcommand)]
pub enum EntriesCommands {
    /// Show an entry of a user's subscription
    Show {
        username: String,
        /// Sport key (running, cycling, boxing, soccer)
        sport: SportKind,
        /// Entry id
        id: u64,
        /// Read as the owning user
        #[arg(short, long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct EntryOutput {
    id: Option<u64>,
    sport: &'static str,
    publicvisible: Option<u8>,
    comment: Option<String>,
    entrydate: Option<String>,
    entryduration: Option<u32>,
    entrylocation: Option<String>,
    numberofrounds: Option<u32>,
    courselength: Option<u32>,
    coursetype: Option<String>,
    track: Option<String>,
    datecreated: Option<i64>,
    datemodified: Option<i64>,
}

impl From<&Entry> for EntryOutput {
    fn from(entry: &Entry) -> Self {
        let course = entry.details.course();
        Self {
            id: entry.id(),
            sport: entry.sport().as_str(),
            publicvisible: entry.publicvisible,
            comment: entry.comment.clone(),
            entrydate: entry.entrydate.map(|d| d.format("%Y-%m-%d").to_string()),
            entryduration: entry.entryduration,
            entrylocation: entry.entrylocation.clone(),
            numberofrounds: entry.details.numberofrounds(),
            courselength: course.and_then(|c| c.courselength),
            coursetype: course.and_then(|c| c.coursetype.clone()),
            track: course.and_then(|c| c.track.clone()),
            datecreated: entry.datecreated(),
            datemodified: entry.datemodified(),
        }
    }
}

pub fn run(command: EntriesCommands) -> Result<()> {
    match command {
        EntriesCommands::Show { username, sport, id, password, json } => {
            show(&username, sport, id, password, json)
        }
    }
}

fn show(username: &str, sport: SportKind, id: u64, password: Option<String>, json: bool) -> Result<()> {
    let client = get_client()?;
    let mut user = User::new(&client, username);
    if let Some(password) = password {
        user = user.with_password(password);
    }
    let subscription = Subscription::for_user(&client, user, sport);
    let mut entry = Entry::new(&subscription).with_id(id);
    entry
        .update()
        .with_context(|| format!("Failed to fetch entry {}/{}", subscription, id))?;
    tracing::debug!(subscription = %subscription, id, "entry fetched");

    if json {
        println!("{}", serde_json::to_string_pretty(&EntryOutput::from(&entry))?);
        return Ok(());
    }

    println!("{}", format!("{}/{}", subscription, entry).bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Date".to_string(), output::or_dash(entry.entrydate)]);
    table.add_row(vec!["Duration".to_string(), output::format_duration(entry.entryduration)]);
    table.add_row(vec!["Location".to_string(), output::or_dash(entry.entrylocation.as_deref())]);
    table.add_row(vec!["Comment".to_string(), output::or_dash(entry.comment.as_deref())]);
    table.add_row(vec!["Rounds".to_string(), output::or_dash(entry.details.numberofrounds())]);
    if let Some(course) = entry.details.course() {
        table.add_row(vec!["Course length".to_string(), output::or_dash(course.courselength)]);
        table.add_row(vec!["Course type".to_string(), output::or_dash(course.coursetype.as_deref())]);
        table.add_row(vec!["Track".to_string(), output::or_dash(course.track.as_deref())]);
    }
    match &entry.details {
        SportDetails::Cycling { bicycletype, .. } => {
            table.add_row(vec!["Bicycle".to_string(), output::or_dash(bicycletype.as_deref())]);
        }
        SportDetails::Boxing { roundduration, .. } => {
            table.add_row(vec!["Round duration".to_string(), output::format_duration(*roundduration)]);
        }
        _ => {}
    }
    table.add_row(vec!["Created".to_string(), output::format_timestamp(entry.datecreated())]);
    table.add_row(vec!["Modified".to_string(), output::format_timestamp(entry.datemodified())]);
    println!("{}", table);
    Ok(())
}
