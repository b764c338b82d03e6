//! Coach Core - client library for the CyberCoach fitness tracking service
//!
//! Remote resources (users, sports, partnerships, subscriptions and entries)
//! are modeled as local objects kept in sync over HTTP. Reads are JSON,
//! writes are XML. The crate follows a hexagonal layout:
//!
//! - **domain**: credentials, sport kinds, write payloads, URI keys, errors
//! - **ports**: the [`Transport`](ports::Transport) trait
//! - **adapters**: reqwest transport and the in-memory demo service
//! - **resources**: the entities and their update/save/delete protocol
//! - **services**: credential resolution and the listing engine

pub mod adapters;
pub mod client;
pub mod config;
pub mod domain;
pub mod ports;
pub mod resources;
pub mod services;

// Re-export commonly used types at crate root
pub use adapters::http::ReqwestTransport;
pub use adapters::memory::InMemoryCoach;
pub use client::Client;
pub use config::Config;
pub use domain::result::{Error, Result};
pub use domain::{Credential, Payload, SportKind};
pub use resources::{
    AnyResource, Course, Entry, IntoUser, Partnership, Resource, Sport, SportDetails, Subscription,
    SubscriptionOwner, User,
};
pub use services::{CredentialResolver, ListOptions, Listable};
