//! Remote resources of the service
//!
//! Every resource is addressable by a URL derived from its identifying
//! fields and is synchronized explicitly: `update` replaces the local
//! attributes (and owned children) with the server's view, `save` writes
//! the local attributes back, `delete` removes the server-side resource.

mod document;
mod entry;
mod partnership;
mod sport;
mod subscription;
mod user;

use std::fmt;

pub use entry::{Course, Entry, SportDetails};
pub use partnership::Partnership;
pub use sport::Sport;
pub use subscription::{Subscription, SubscriptionOwner};
pub use user::User;

use crate::client::Client;
use crate::domain::result::{Error, Result};
use crate::domain::Credential;
use crate::services::CredentialResolver;

/// Behaviour shared by all resources
pub trait Resource {
    fn client(&self) -> &Client;

    /// Canonical URL, `None` while the resource has no identity yet
    fn location(&self) -> Option<String>;

    /// Identities allowed to read the resource, in trial order
    ///
    /// Empty for resources that are always read anonymously.
    fn readers(&self) -> Vec<&User> {
        Vec::new()
    }

    /// Credential of the first reader that authenticates, if any
    fn read_credential(&self) -> Result<Option<Credential>> {
        let readers = self.readers();
        let reader = CredentialResolver::new(self.client()).resolve_optional(&readers)?;
        Ok(reader.map(|user| user.credential().clone()))
    }

    /// Whether the resource exists on the service
    ///
    /// Reads as the first authenticating reader, anonymously otherwise.
    fn exist(&self) -> Result<bool> {
        let Some(url) = self.location() else {
            return Ok(false);
        };
        let credential = self.read_credential()?;
        exist_at(self.client(), &url, credential.as_ref())
    }
}

/// Existence check: NotFound is `false`, success is `true`, anything else
/// is propagated
pub fn exist_at(client: &Client, url: &str, credential: Option<&Credential>) -> Result<bool> {
    match client.get(url, credential) {
        Ok(_) => Ok(true),
        Err(Error::NotFound(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Anything that names a user: an existing [`User`] or a bare username
pub trait IntoUser {
    fn into_user(self, client: &Client) -> User;
}

impl IntoUser for User {
    fn into_user(self, _client: &Client) -> User {
        self
    }
}

impl IntoUser for &User {
    fn into_user(self, _client: &Client) -> User {
        self.clone()
    }
}

impl IntoUser for &str {
    fn into_user(self, client: &Client) -> User {
        User::new(client, self)
    }
}

impl IntoUser for String {
    fn into_user(self, client: &Client) -> User {
        User::new(client, self)
    }
}

/// Snapshot of any resource, carried by write errors
#[derive(Debug, Clone)]
pub enum AnyResource {
    User(User),
    Sport(Sport),
    Partnership(Partnership),
    Subscription(Subscription),
    Entry(Entry),
}

impl fmt::Display for AnyResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyResource::User(user) => write!(f, "user {}", user),
            AnyResource::Sport(sport) => write!(f, "sport {}", sport),
            AnyResource::Partnership(partnership) => write!(f, "partnership {}", partnership),
            AnyResource::Subscription(subscription) => write!(f, "subscription {}", subscription),
            AnyResource::Entry(entry) => match entry.id() {
                Some(id) => write!(f, "entry {}/{}", entry.subscription(), id),
                None => write!(f, "entry {}/(new)", entry.subscription()),
            },
        }
    }
}

impl From<User> for AnyResource {
    fn from(user: User) -> Self {
        AnyResource::User(user)
    }
}

impl From<Sport> for AnyResource {
    fn from(sport: Sport) -> Self {
        AnyResource::Sport(sport)
    }
}

impl From<Partnership> for AnyResource {
    fn from(partnership: Partnership) -> Self {
        AnyResource::Partnership(partnership)
    }
}

impl From<Subscription> for AnyResource {
    fn from(subscription: Subscription) -> Self {
        AnyResource::Subscription(subscription)
    }
}

impl From<Entry> for AnyResource {
    fn from(entry: Entry) -> Self {
        AnyResource::Entry(entry)
    }
}

/// Map the status of an accepted-or-rejected write
///
/// 200/201 succeed, 409 means the server wants more fields, anything else
/// is reported through `rejected`.
pub(crate) fn check_write<R, F>(status: u16, resource: &R, rejected: F) -> Result<()>
where
    R: Clone + Into<AnyResource>,
    F: FnOnce(&R) -> Error,
{
    match status {
        200 | 201 => Ok(()),
        409 => Err(Error::IncompleteInformation(Box::new(resource.clone().into()))),
        _ => Err(rejected(resource)),
    }
}

/// `NotSaved` carrying a snapshot of the resource
pub(crate) fn not_saved<R: Clone + Into<AnyResource>>(resource: &R) -> Error {
    Error::NotSaved(Box::new(resource.clone().into()))
}
