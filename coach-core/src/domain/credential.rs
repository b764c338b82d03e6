//! Credential domain model

use std::fmt;

/// A username/password pair used for HTTP basic authentication
///
/// A credential without a password is an anonymous identity: it never
/// authenticates and is never sent over the wire.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: Option<String>,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Credential that carries only a username
    pub fn anonymous(username: impl Into<String>) -> Self {
        Self::new(username, None)
    }

    /// Whether this credential can be sent as basic auth at all
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }
}

// Passwords must never end up in logs or error output.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
