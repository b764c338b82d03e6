//! Core domain types
//!
//! Pure data and parsing helpers shared by every resource - no I/O.

mod credential;
pub mod payload;
pub mod result;
mod sport;
pub mod uri;

pub use credential::Credential;
pub use payload::Payload;
pub use sport::SportKind;
