//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The resources
//! depend only on these traits, not on concrete implementations.

mod transport;

pub use transport::{HttpRequest, HttpResponse, Method, Transport};
