//! Credential resolution
//!
//! Several operations can be performed by either of two identities (the
//! members of a partnership) and the caller does not have to know which one
//! holds a valid password. The resolver checks the candidates strictly in
//! order against the service's authentication check and returns the first
//! that succeeds. Probing failures are absorbed; only "nobody authenticated"
//! is reported.

use crate::client::Client;
use crate::domain::result::{Error, Result};
use crate::domain::Credential;
use crate::resources::User;

/// Picks the acting identity for an operation
pub struct CredentialResolver<'a> {
    client: &'a Client,
}

impl<'a> CredentialResolver<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// First candidate whose credential authenticates
    ///
    /// Candidates without a password are skipped without a request. Fails
    /// with `Unauthorized` (naming the last candidate tried) when none
    /// authenticates.
    pub fn resolve<'u>(&self, candidates: &[&'u User]) -> Result<&'u User> {
        self.resolve_optional(candidates)?.ok_or_else(|| match candidates.last() {
            Some(user) => Error::unauthorized_as(user),
            None => Error::unauthorized(),
        })
    }

    /// Like [`resolve`](Self::resolve), but "nobody authenticated" is `None`
    ///
    /// Used by reads that may fall back to anonymous access.
    pub fn resolve_optional<'u>(&self, candidates: &[&'u User]) -> Result<Option<&'u User>> {
        for candidate in candidates {
            if self.client.authenticated(candidate.credential())? {
                tracing::debug!(username = %candidate.username(), "credential accepted");
                return Ok(Some(*candidate));
            }
            tracing::debug!(username = %candidate.username(), "credential rejected");
        }
        Ok(None)
    }

    /// First candidate that authenticates, otherwise the last candidate
    ///
    /// Never reports `Unauthorized` itself: an invalid fallback only fails
    /// once the write performed with it is rejected.
    pub fn resolve_or_last<'u>(&self, candidates: &[&'u User]) -> Result<&'u User> {
        if let Some(user) = self.resolve_optional(candidates)? {
            return Ok(user);
        }
        candidates
            .last()
            .copied()
            .ok_or_else(Error::unauthorized)
    }
}

/// Credential of `user` if it can be sent at all
///
/// Writes are never attempted without a password.
pub fn require_password(user: &User) -> Result<&Credential> {
    let credential = user.credential();
    if credential.has_password() {
        Ok(credential)
    } else {
        Err(Error::unauthorized_as(user))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::memory::InMemoryCoach;

    fn setup() -> (Client, Arc<InMemoryCoach>) {
        let service = Arc::new(InMemoryCoach::seeded());
        let client = Client::new("http://coach.test", "/CyberCoachServer/resources/", service.clone());
        (client, service)
    }

    #[test]
    fn test_invalid_then_valid_returns_valid() {
        let (client, _) = setup();
        let invalid = User::new(&client, "user123").with_password("wrong");
        let valid = User::new(&client, "user321").with_password("test321");

        let resolved = CredentialResolver::new(&client)
            .resolve(&[&invalid, &valid])
            .unwrap();
        assert_eq!(resolved.username(), "user321");
    }

    #[test]
    fn test_first_valid_wins() {
        let (client, service) = setup();
        let first = User::new(&client, "user123").with_password("test123");
        let second = User::new(&client, "user321").with_password("test321");

        let before = service.request_count();
        let resolved = CredentialResolver::new(&client)
            .resolve(&[&first, &second])
            .unwrap();
        assert_eq!(resolved.username(), "user123");
        // The second candidate is never checked
        assert_eq!(service.request_count(), before + 1);
    }

    #[test]
    fn test_all_invalid_is_unauthorized() {
        let (client, _) = setup();
        let a = User::new(&client, "user123").with_password("wrong");
        let b = User::new(&client, "user321").with_password("wrong");

        let err = CredentialResolver::new(&client).resolve(&[&a, &b]).unwrap_err();
        match err {
            Error::Unauthorized { user: Some(user) } => assert_eq!(user.username(), "user321"),
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_password_skips_network() {
        let (client, service) = setup();
        let anonymous = User::new(&client, "user123");

        let before = service.request_count();
        let err = CredentialResolver::new(&client).resolve(&[&anonymous]).unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(service.request_count(), before);
    }

    #[test]
    fn test_resolve_or_last_defaults_to_last() {
        let (client, _) = setup();
        let a = User::new(&client, "partner1");
        let b = User::new(&client, "partner2").with_password("wrong");

        let resolved = CredentialResolver::new(&client)
            .resolve_or_last(&[&a, &b])
            .unwrap();
        assert_eq!(resolved.username(), "partner2");
    }

    #[test]
    fn test_require_password() {
        let (client, _) = setup();
        assert!(require_password(&User::new(&client, "user123")).is_err());
        let user = User::new(&client, "user123").with_password("anything");
        assert_eq!(require_password(&user).unwrap().username, "user123");
    }
}
