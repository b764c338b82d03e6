//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - reqwest blocking client for the Transport port
//! - an in-memory CyberCoach service for tests and demo mode

pub mod http;
pub mod memory;
