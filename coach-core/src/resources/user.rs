use std::fmt;

use serde_json::Value as JsonValue;

use super::document::{has_next, UserDocument};
use super::{check_write, not_saved, Partnership, Resource, Subscription};
use crate::client::Client;
use crate::domain::result::{Error, Result};
use crate::domain::{uri, Credential, Payload, SportKind};
use crate::ports::{HttpRequest, Method};
use crate::services::listing::{self, ListOptions, Listable};
use crate::services::CredentialResolver;

/// A user of the service, identified by its username
#[derive(Debug, Clone)]
pub struct User {
    client: Client,
    credential: Credential,
    /// Password to set on the next `save`
    pub newpassword: Option<String>,
    pub realname: Option<String>,
    pub email: Option<String>,
    pub publicvisible: Option<u8>,
    datecreated: Option<i64>,
    partnerships: Vec<Partnership>,
    subscriptions: Vec<Subscription>,
}

impl User {
    pub fn new(client: &Client, username: impl Into<String>) -> Self {
        Self {
            client: client.clone(),
            credential: Credential::anonymous(username),
            newpassword: None,
            realname: None,
            email: None,
            publicvisible: None,
            datecreated: None,
            partnerships: Vec::new(),
            subscriptions: Vec::new(),
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.credential.password = Some(password.into());
        self
    }

    pub fn with_realname(mut self, realname: impl Into<String>) -> Self {
        self.realname = Some(realname.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_publicvisible(mut self, publicvisible: u8) -> Self {
        self.publicvisible = Some(publicvisible);
        self
    }

    pub fn username(&self) -> &str {
        &self.credential.username
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn password(&self) -> Option<&str> {
        self.credential.password.as_deref()
    }

    pub fn set_password(&mut self, password: Option<String>) {
        self.credential.password = password;
    }

    pub fn datecreated(&self) -> Option<i64> {
        self.datecreated
    }

    /// Partnerships found by the last `update`
    pub fn partnerships(&self) -> &[Partnership] {
        &self.partnerships
    }

    /// Subscriptions found by the last `update`
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn url(&self) -> String {
        self.client
            .resource_url(&format!("{}{}", <Self as Listable>::PATH, self.username()))
    }

    /// This user without its child collections
    ///
    /// Children refer back to their owner through this snapshot.
    pub(crate) fn identity(&self) -> Self {
        Self {
            partnerships: Vec::new(),
            subscriptions: Vec::new(),
            ..self.clone()
        }
    }

    /// Whether the user's credential is valid on the service
    pub fn authenticated(&self) -> Result<bool> {
        self.client.authenticated(&self.credential)
    }

    /// Fetch the user with the first page of its partnerships
    pub fn update(&mut self) -> Result<()> {
        self.update_with(ListOptions::default())
    }

    /// Fetch the user, paging its partnerships with `options`
    ///
    /// Reads as the user when its credential authenticates, anonymously
    /// otherwise. Partnerships and subscriptions are rebuilt from scratch.
    pub fn update_with(&mut self, options: ListOptions) -> Result<()> {
        let readers = [&*self];
        let credential = CredentialResolver::new(&self.client)
            .resolve_optional(&readers)?
            .map(|user| user.credential().clone());

        let url = self.url();
        let (mut start, size) = options.window(&self.client);
        let mut pairs = Vec::new();

        let document = loop {
            let request = HttpRequest::new(Method::Get, url.as_str())
                .credential(credential.as_ref())
                .query("start", start)
                .query("size", size);
            let document: UserDocument = self.client.get_request(request)?.json()?;

            let Some(refs) = document.partnerships.as_ref() else {
                break document;
            };
            for reference in refs {
                pairs.push(uri::partnership_users(&reference.uri)?);
            }

            let more = document.links.as_deref().is_some_and(has_next);
            if !(options.all && more) {
                break document;
            }
            start += size;
        };

        self.realname = document.realname;
        self.email = document.email;
        self.publicvisible = document.publicvisible;
        self.datecreated = document.datecreated;

        let identity = self.identity();
        self.partnerships = pairs
            .into_iter()
            .map(|(user1, user2)| {
                if user1 == identity.username() {
                    Partnership::new(&self.client, &identity, user2)
                } else {
                    Partnership::new(&self.client, user1, &identity)
                }
            })
            .collect();
        self.subscriptions = document
            .subscriptions
            .unwrap_or_default()
            .iter()
            .map(|reference| -> Result<Subscription> {
                let sport: SportKind = uri::last_segment(&reference.uri)?.parse()?;
                Ok(Subscription::for_user(&self.client, &identity, sport))
            })
            .collect::<Result<_>>()?;

        tracing::debug!(
            username = %self.username(),
            partnerships = self.partnerships.len(),
            subscriptions = self.subscriptions.len(),
            "user updated"
        );
        Ok(())
    }

    fn payload(&self) -> Payload {
        let password = self.newpassword.as_deref().or(self.password());
        Payload::new("user")
            .field("password", password)
            .field("realname", self.realname.as_deref())
            .field("email", self.email.as_deref())
            .field("publicvisible", self.publicvisible)
    }

    /// Create the user, or overwrite it when it already exists
    ///
    /// Sent with the user's own credential, not resolved: registering a new
    /// user must work before that credential is valid. A pending
    /// `newpassword` becomes the user's password once the write succeeds.
    pub fn save(&mut self) -> Result<()> {
        let response = self
            .client
            .put(&self.url(), Some(&self.credential), &self.payload())
            .map_err(|e| e.with_user(self))?;
        check_write(response.status(), &*self, not_saved)?;

        if let Some(password) = self.newpassword.take() {
            self.credential.password = Some(password);
        }
        tracing::info!(username = %self.username(), "user saved");
        Ok(())
    }

    /// Delete the user on the service
    ///
    /// The local object stays usable and can be saved again.
    pub fn delete(&self) -> Result<bool> {
        let url = self.url();
        if !self.exist()? {
            return Err(Error::not_found(url));
        }
        self.client
            .delete(&url, Some(&self.credential))
            .map_err(|e| e.with_user(self))?;
        tracing::info!(username = %self.username(), "user deleted");
        Ok(true)
    }

    /// Number of users on the service
    pub fn total(client: &Client) -> Result<usize> {
        listing::total::<Self>(client)
    }

    /// Users in the window given by `options`, identified but not updated
    pub fn list(client: &Client, options: ListOptions) -> Result<Vec<Self>> {
        listing::list(client, options)
    }

    /// Like [`User::list`], keeping only users accepted by `keep`
    pub fn list_where<F>(client: &Client, options: ListOptions, keep: F) -> Result<Vec<Self>>
    where
        F: FnMut(&Self) -> bool,
    {
        listing::list_where(client, options, keep)
    }
}

impl Resource for User {
    fn client(&self) -> &Client {
        &self.client
    }

    fn location(&self) -> Option<String> {
        Some(self.url())
    }

    fn readers(&self) -> Vec<&User> {
        vec![self]
    }
}

impl Listable for User {
    const PATH: &'static str = "users/";
    const COLLECTION: &'static str = "users";

    fn from_item(client: &Client, item: &JsonValue) -> Result<Self> {
        if let Some(username) = item.get("username").and_then(JsonValue::as_str) {
            return Ok(Self::new(client, username));
        }
        let uri = item
            .get("uri")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| Error::Decode("user item without username or uri".to_string()))?;
        Ok(Self::new(client, uri::username(uri)?))
    }
}

/// Users are the same user when their usernames match
impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.username() == other.username()
    }
}

impl Eq for User {}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.username())
    }
}
