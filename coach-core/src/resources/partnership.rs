//! Partnerships and their confirmation handshake
//!
//! A partnership is the ordered pair `(user1, user2)`. Each member confirms
//! it independently: user1 proposes, user2 confirms, and the partnership is
//! operational once both flags are set. Either side can withdraw again
//! (`cancel` for user1, `invalidate` for user2).

use std::fmt;

use serde_json::Value as JsonValue;

use super::document::PartnershipDocument;
use super::{check_write, not_saved, IntoUser, Resource, Subscription, User};
use crate::client::Client;
use crate::domain::result::{Error, Result};
use crate::domain::{uri, Payload, SportKind};
use crate::ports::HttpResponse;
use crate::services::listing::{self, ListOptions, Listable};
use crate::services::require_password;

#[derive(Debug, Clone)]
pub struct Partnership {
    client: Client,
    user1: User,
    user2: User,
    pub publicvisible: Option<u8>,
    id: Option<u64>,
    datecreated: Option<i64>,
    user1_confirmed: Option<bool>,
    user2_confirmed: Option<bool>,
    subscriptions: Vec<Subscription>,
}

impl Partnership {
    pub fn new(client: &Client, user1: impl IntoUser, user2: impl IntoUser) -> Self {
        Self {
            client: client.clone(),
            user1: user1.into_user(client),
            user2: user2.into_user(client),
            publicvisible: None,
            id: None,
            datecreated: None,
            user1_confirmed: None,
            user2_confirmed: None,
            subscriptions: Vec::new(),
        }
    }

    pub fn with_publicvisible(mut self, publicvisible: u8) -> Self {
        self.publicvisible = Some(publicvisible);
        self
    }

    pub fn user1(&self) -> &User {
        &self.user1
    }

    pub fn user2(&self) -> &User {
        &self.user2
    }

    pub fn user1_mut(&mut self) -> &mut User {
        &mut self.user1
    }

    pub fn user2_mut(&mut self) -> &mut User {
        &mut self.user2
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn datecreated(&self) -> Option<i64> {
        self.datecreated
    }

    /// Whether user1 confirmed; `None` until fetched or acted upon
    pub fn user1_confirmed(&self) -> Option<bool> {
        self.user1_confirmed
    }

    /// Whether user2 confirmed; `None` until fetched or acted upon
    pub fn user2_confirmed(&self) -> Option<bool> {
        self.user2_confirmed
    }

    /// Both members confirmed
    ///
    /// `None` while either confirmation is unknown. Never touches the network.
    pub fn operational(&self) -> Option<bool> {
        match (self.user1_confirmed, self.user2_confirmed) {
            (Some(c1), Some(c2)) => Some(c1 && c2),
            _ => None,
        }
    }

    /// Subscriptions found by the last `update`
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn url(&self) -> String {
        self.client.resource_url(&format!(
            "{}{}",
            <Self as Listable>::PATH,
            self
        ))
    }

    /// This partnership without its subscriptions
    pub(crate) fn identity(&self) -> Self {
        Self {
            subscriptions: Vec::new(),
            ..self.clone()
        }
    }

    /// Fetch the partnership and its subscriptions
    ///
    /// Reads as the first member whose credential authenticates, anonymously
    /// when neither does.
    pub fn update(&mut self) -> Result<()> {
        let credential = self.read_credential()?;
        let document: PartnershipDocument =
            self.client.get(&self.url(), credential.as_ref())?.json()?;

        self.id = document.id;
        self.datecreated = document.datecreated;
        self.publicvisible = document.publicvisible;
        self.apply_confirmation(&document);

        let identity = self.identity();
        self.subscriptions = document
            .subscriptions
            .unwrap_or_default()
            .iter()
            .map(|reference| -> Result<Subscription> {
                let sport: SportKind = uri::last_segment(&reference.uri)?.parse()?;
                Ok(Subscription::for_partnership(&self.client, identity.clone(), sport))
            })
            .collect::<Result<_>>()?;
        Ok(())
    }

    fn payload(&self) -> Payload {
        Payload::new("partnership").field("publicvisible", self.publicvisible)
    }

    /// Take over the confirmation flags of a server document
    ///
    /// The document may name the members in the opposite order.
    fn apply_confirmation(&mut self, document: &PartnershipDocument) {
        let swapped = document
            .user1
            .as_ref()
            .is_some_and(|user| user.username != self.user1.username());
        if swapped {
            self.user1_confirmed = document.userconfirmed2;
            self.user2_confirmed = document.userconfirmed1;
        } else {
            self.user1_confirmed = document.userconfirmed1;
            self.user2_confirmed = document.userconfirmed2;
        }
    }

    /// Apply the flags carried by a write response, if it has any
    fn apply_response(&mut self, response: &HttpResponse) -> bool {
        match response.json::<PartnershipDocument>() {
            Ok(document) if document.userconfirmed1.is_some() || document.userconfirmed2.is_some() => {
                self.apply_confirmation(&document);
                true
            }
            _ => false,
        }
    }

    /// Confirm the partnership as user1
    pub fn propose(&mut self) -> Result<()> {
        let credential = require_password(&self.user1)?;
        let response = self
            .client
            .put(&self.url(), Some(credential), &self.payload())
            .map_err(|e| e.with_user(&self.user1))?;
        check_write(response.status(), &*self, |p| Error::NotProposed(Box::new(p.clone())))?;

        if !self.apply_response(&response) {
            self.user1_confirmed = Some(true);
        }
        tracing::info!(partnership = %self, "partnership proposed");
        Ok(())
    }

    /// Confirm the partnership as user2
    pub fn confirm(&mut self) -> Result<()> {
        let credential = require_password(&self.user2)?;
        let response = self
            .client
            .put(&self.url(), Some(credential), &self.payload())
            .map_err(|e| e.with_user(&self.user2))?;
        check_write(response.status(), &*self, |p| Error::NotConfirmed(Box::new(p.clone())))?;

        if !self.apply_response(&response) {
            self.user2_confirmed = Some(true);
        }
        tracing::info!(partnership = %self, "partnership confirmed");
        Ok(())
    }

    /// Move the partnership one step towards operational, or save its
    /// attributes once it is
    ///
    /// Proposes while user1 has not confirmed, confirms otherwise. Two calls
    /// take a new partnership to operational.
    pub fn save(&mut self) -> Result<()> {
        if self.operational() == Some(true) {
            return self.save_attributes();
        }
        if self.user1_confirmed != Some(true) {
            self.propose()
        } else {
            self.confirm()
        }
    }

    /// Plain PUT as user1, retried as user2 when user1 is rejected
    fn save_attributes(&mut self) -> Result<()> {
        let url = self.url();
        let payload = self.payload();
        let response = match self.client.put(&url, Some(self.user1.credential()), &payload) {
            Err(Error::Unauthorized { .. }) => self
                .client
                .put(&url, Some(self.user2.credential()), &payload)
                .map_err(|e| e.with_user(&self.user2))?,
            other => other?,
        };
        check_write(response.status(), &*self, not_saved)?;
        self.apply_response(&response);
        Ok(())
    }

    /// Withdraw user1's confirmation
    pub fn cancel(&mut self) -> Result<()> {
        self.withdraw_as_user1()?;
        tracing::info!(partnership = %self, "partnership cancelled");
        Ok(())
    }

    /// Withdraw user2's confirmation
    pub fn invalidate(&mut self) -> Result<()> {
        let credential = require_password(&self.user2)?;
        let response = self
            .client
            .delete(&self.url(), Some(credential))
            .map_err(|e| e.with_user(&self.user2))?;
        if !self.apply_response(&response) {
            self.user2_confirmed = Some(false);
        }
        tracing::info!(partnership = %self, "partnership invalidated");
        Ok(())
    }

    fn withdraw_as_user1(&mut self) -> Result<()> {
        let credential = require_password(&self.user1)?;
        let response = self
            .client
            .delete(&self.url(), Some(credential))
            .map_err(|e| e.with_user(&self.user1))?;
        if !self.apply_response(&response) {
            self.user1_confirmed = Some(false);
        }
        Ok(())
    }

    /// Tear the partnership down from both sides
    ///
    /// Invalidates first if user2 confirmed, then withdraws user1's
    /// confirmation. Unknown flags are fetched first.
    pub fn delete(&mut self) -> Result<bool> {
        if !self.exist()? {
            return Err(Error::not_found(self.url()));
        }
        if self.operational().is_none() {
            self.update()?;
        }
        if self.user2_confirmed == Some(true) {
            self.invalidate()?;
        }
        if self.user1_confirmed == Some(true) {
            self.withdraw_as_user1()?;
        }
        tracing::info!(partnership = %self, "partnership deleted");
        Ok(true)
    }

    pub fn total(client: &Client) -> Result<usize> {
        listing::total::<Self>(client)
    }

    pub fn list(client: &Client, options: ListOptions) -> Result<Vec<Self>> {
        listing::list(client, options)
    }

    pub fn list_where<F>(client: &Client, options: ListOptions, keep: F) -> Result<Vec<Self>>
    where
        F: FnMut(&Self) -> bool,
    {
        listing::list_where(client, options, keep)
    }
}

impl Resource for Partnership {
    fn client(&self) -> &Client {
        &self.client
    }

    fn location(&self) -> Option<String> {
        Some(self.url())
    }

    fn readers(&self) -> Vec<&User> {
        vec![&self.user1, &self.user2]
    }
}

impl Listable for Partnership {
    const PATH: &'static str = "partnerships/";
    const COLLECTION: &'static str = "partnerships";

    fn from_item(client: &Client, item: &JsonValue) -> Result<Self> {
        let uri = item
            .get("uri")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| Error::Decode("partnership item without uri".to_string()))?;
        let (user1, user2) = uri::partnership_users(uri)?;
        Ok(Self::new(client, user1, user2))
    }
}

impl fmt::Display for Partnership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.user1.username(), self.user2.username())
    }
}
