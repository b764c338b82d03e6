//! Service layer - protocol logic shared by the resources
//!
//! Credential resolution picks the acting identity for an operation; the
//! listing engine implements `total`, paged `list` and list-all scans.

pub mod listing;
mod resolver;

pub use listing::{ListOptions, Listable, DEFAULT_PAGE_SIZE};
pub use resolver::{require_password, CredentialResolver};
