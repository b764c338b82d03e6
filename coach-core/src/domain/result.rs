//! Result and error types for the core library

use thiserror::Error;

use crate::resources::{AnyResource, Partnership, User};

/// Core library error type
///
/// Write failures carry a snapshot of the entity that was rejected so
/// callers can inspect what they tried to send.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized{}", identity_suffix(.user))]
    Unauthorized { user: Option<Box<User>> },

    #[error("Incomplete information for {0}")]
    IncompleteInformation(Box<AnyResource>),

    #[error("Could not save {0}")]
    NotSaved(Box<AnyResource>),

    #[error("Could not propose partnership {0}")]
    NotProposed(Box<Partnership>),

    #[error("Could not confirm partnership {0}")]
    NotConfirmed(Box<Partnership>),

    #[error("Unexpected HTTP {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown sport: {0}")]
    UnknownSport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Unauthorized without a known identity
    pub fn unauthorized() -> Self {
        Self::Unauthorized { user: None }
    }

    /// Unauthorized as the given user
    pub fn unauthorized_as(user: &User) -> Self {
        Self::Unauthorized {
            user: Some(Box::new(user.clone())),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Attach the rejected identity if the error does not carry one yet
    pub(crate) fn with_user(self, user: &User) -> Self {
        match self {
            Self::Unauthorized { user: None } => Self::unauthorized_as(user),
            other => other,
        }
    }
}

fn identity_suffix(user: &Option<Box<User>>) -> String {
    user.as_ref()
        .map(|u| format!(" as '{}'", u.username()))
        .unwrap_or_default()
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryCoach;
    use crate::client::Client;

    #[test]
    fn test_unauthorized_message_names_user() {
        let client = Client::new("http://coach.test", "/resources/", InMemoryCoach::shared());
        let user = User::new(&client, "user123");
        let err = Error::unauthorized().with_user(&user);
        assert_eq!(err.to_string(), "Unauthorized as 'user123'");
        assert_eq!(Error::unauthorized().to_string(), "Unauthorized");
    }

    #[test]
    fn test_with_user_keeps_other_errors() {
        let client = Client::new("http://coach.test", "/resources/", InMemoryCoach::shared());
        let user = User::new(&client, "user123");
        let err = Error::not_found("users/ghost").with_user(&user);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: users/ghost");
    }
}
