//! Subscriptions bind an owner (a user or a partnership) to one sport
//!
//! Both kinds share the same protocol; they differ in the owner's URL and in
//! which identities may act for them (the user itself, or either member of
//! the partnership in order).

use std::fmt;

use serde_json::Value as JsonValue;

use super::document::{has_next, SubscriptionDocument};
use super::{check_write, not_saved, Entry, IntoUser, Partnership, Resource, User};
use crate::client::Client;
use crate::domain::result::{Error, Result};
use crate::domain::{uri, Payload, SportKind};
use crate::ports::{HttpRequest, Method};
use crate::services::listing::ListOptions;
use crate::services::CredentialResolver;

/// Owner of a subscription
#[derive(Debug, Clone)]
pub enum SubscriptionOwner {
    User(User),
    Partnership(Partnership),
}

impl SubscriptionOwner {
    pub fn url(&self) -> String {
        match self {
            SubscriptionOwner::User(user) => user.url(),
            SubscriptionOwner::Partnership(partnership) => partnership.url(),
        }
    }

    /// Identities that may act for the owner, in trial order
    pub fn members(&self) -> Vec<&User> {
        match self {
            SubscriptionOwner::User(user) => vec![user],
            SubscriptionOwner::Partnership(partnership) => {
                vec![partnership.user1(), partnership.user2()]
            }
        }
    }
}

impl fmt::Display for SubscriptionOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionOwner::User(user) => write!(f, "{}", user),
            SubscriptionOwner::Partnership(partnership) => write!(f, "{}", partnership),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Subscription {
    client: Client,
    owner: SubscriptionOwner,
    sport: SportKind,
    pub publicvisible: Option<u8>,
    id: Option<u64>,
    datesubscribed: Option<i64>,
    entries: Vec<Entry>,
}

impl Subscription {
    fn new(client: &Client, owner: SubscriptionOwner, sport: SportKind) -> Self {
        Self {
            client: client.clone(),
            owner,
            sport,
            publicvisible: None,
            id: None,
            datesubscribed: None,
            entries: Vec::new(),
        }
    }

    /// Subscription of a user to a sport
    pub fn for_user(client: &Client, user: impl IntoUser, sport: SportKind) -> Self {
        Self::new(client, SubscriptionOwner::User(user.into_user(client)), sport)
    }

    /// Subscription of a partnership to a sport
    pub fn for_partnership(client: &Client, partnership: Partnership, sport: SportKind) -> Self {
        Self::new(client, SubscriptionOwner::Partnership(partnership), sport)
    }

    pub fn with_publicvisible(mut self, publicvisible: u8) -> Self {
        self.publicvisible = Some(publicvisible);
        self
    }

    pub fn owner(&self) -> &SubscriptionOwner {
        &self.owner
    }

    pub fn owner_mut(&mut self) -> &mut SubscriptionOwner {
        &mut self.owner
    }

    pub fn sport(&self) -> SportKind {
        self.sport
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn datesubscribed(&self) -> Option<i64> {
        self.datesubscribed
    }

    /// Entries found by the last `update`
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn url(&self) -> String {
        format!("{}/{}", self.owner.url(), self.sport)
    }

    /// This subscription without its entries
    pub(crate) fn identity(&self) -> Self {
        Self {
            entries: Vec::new(),
            ..self.clone()
        }
    }

    /// A new, not yet created entry of this subscription
    pub fn new_entry(&self) -> Entry {
        Entry::new(self)
    }

    pub fn update(&mut self) -> Result<()> {
        self.update_with(ListOptions::default())
    }

    /// Fetch the subscription, paging its entries with `options`
    pub fn update_with(&mut self, options: ListOptions) -> Result<()> {
        let credential = self.read_credential()?;
        let url = self.url();
        let tag = self.sport.entry_tag();
        let (mut start, size) = options.window(&self.client);
        let mut ids = Vec::new();

        let document = loop {
            let request = HttpRequest::new(Method::Get, url.as_str())
                .credential(credential.as_ref())
                .query("start", start)
                .query("size", size);
            let document: SubscriptionDocument = self.client.get_request(request)?.json()?;

            let Some(items) = document.entries.as_ref() else {
                break document;
            };
            for item in items {
                let entry_uri = item
                    .get(tag.as_str())
                    .and_then(|entry| entry.get("uri"))
                    .and_then(JsonValue::as_str)
                    .ok_or_else(|| Error::Decode(format!("entry without '{}' uri", tag)))?;
                ids.push(uri::entry_id(entry_uri)?);
            }

            let more = document.links.as_deref().is_some_and(has_next);
            if !(options.all && more) {
                break document;
            }
            start += size;
        };

        self.id = document.id;
        self.datesubscribed = document.datesubscribed;
        self.publicvisible = document.publicvisible;

        let identity = self.identity();
        self.entries = ids
            .into_iter()
            .map(|id| Entry::new(&identity).with_id(id))
            .collect();
        tracing::debug!(subscription = %self, entries = self.entries.len(), "subscription updated");
        Ok(())
    }

    fn payload(&self) -> Payload {
        Payload::new("subscription").field("publicvisible", self.publicvisible)
    }

    /// Create or overwrite the subscription as the first member that
    /// authenticates
    pub fn save(&mut self) -> Result<()> {
        let members = self.owner.members();
        let actor = CredentialResolver::new(&self.client).resolve(&members)?;
        let response = self
            .client
            .put(&self.url(), Some(actor.credential()), &self.payload())
            .map_err(|e| e.with_user(actor))?;
        check_write(response.status(), &*self, not_saved)?;
        tracing::info!(subscription = %self, "subscription saved");
        Ok(())
    }

    /// Delete the subscription as the first member that authenticates
    pub fn delete(&self) -> Result<bool> {
        let members = self.owner.members();
        let actor = CredentialResolver::new(&self.client).resolve(&members)?;
        self.client
            .delete(&self.url(), Some(actor.credential()))
            .map_err(|e| e.with_user(actor))?;
        tracing::info!(subscription = %self, "subscription deleted");
        Ok(true)
    }
}

impl Resource for Subscription {
    fn client(&self) -> &Client {
        &self.client
    }

    fn location(&self) -> Option<String> {
        Some(self.url())
    }

    fn readers(&self) -> Vec<&User> {
        self.owner.members()
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.sport)
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
    fn test_urls() {
        let (client, _) = setup();
        let user = Subscription::for_user(&client, "user123", SportKind::Running);
        assert_eq!(
            user.url(),
            "http://coach.test/CyberCoachServer/resources/users/user123/running"
        );
        assert_eq!(user.to_string(), "user123/running");

        let partnership = Partnership::new(&client, "user123", "user321");
        let shared = Subscription::for_partnership(&client, partnership, SportKind::Cycling);
        assert_eq!(
            shared.url(),
            "http://coach.test/CyberCoachServer/resources/partnerships/user123;user321/cycling"
        );
        assert_eq!(shared.to_string(), "user123;user321/cycling");
    }

    #[test]
    fn test_update_user_subscription() {
        let (client, _) = setup();
        let user = User::new(&client, "user123").with_password("test123");
        let mut subscription = Subscription::for_user(&client, &user, SportKind::Running);
        subscription.update().unwrap();

        assert!(subscription.id().is_some());
        assert!(!subscription.entries().is_empty());
        assert!(subscription.entries().iter().all(|e| e.id().is_some()));
    }

    #[test]
    fn test_update_entries_see_fetched_subscription() {
        let (client, _) = setup();
        let user = User::new(&client, "user123").with_password("test123");
        let mut subscription = Subscription::for_user(&client, &user, SportKind::Running);
        subscription.update().unwrap();

        let entry = &subscription.entries()[0];
        assert_eq!(entry.subscription().id(), subscription.id());
        assert_eq!(entry.subscription().publicvisible, subscription.publicvisible);
        assert!(entry.subscription().datesubscribed().is_some());
    }

    #[test]
    fn test_update_pages_entries() {
        let (client, _) = setup();
        let client = client.with_list_all_size(1);
        let user = User::new(&client, "user123").with_password("test123");
        let mut subscription = Subscription::for_user(&client, &user, SportKind::Running);

        subscription.update_with(ListOptions::default().size(1)).unwrap();
        assert_eq!(subscription.entries().len(), 1);

        subscription.update_with(ListOptions::everything()).unwrap();
        assert!(subscription.entries().len() > 1);
    }

    #[test]
    fn test_save_and_delete_partnership_subscription_as_second_member() {
        let (client, _) = setup();
        let partnership = Partnership::new(
            &client,
            User::new(&client, "partner1").with_password("wrong"),
            User::new(&client, "partner2").with_password("password"),
        );
        let mut subscription =
            Subscription::for_partnership(&client, partnership, SportKind::Soccer).with_publicvisible(2);

        subscription.save().unwrap();
        assert!(subscription.exist().unwrap());
        assert!(subscription.delete().unwrap());
        assert!(!subscription.exist().unwrap());
    }

    #[test]
    fn test_save_without_valid_member() {
        let (client, _) = setup();
        let user = User::new(&client, "subscriber").with_password("wrong");
        let mut subscription = Subscription::for_user(&client, user, SportKind::Boxing);
        assert!(subscription.save().unwrap_err().is_unauthorized());
    }

    #[test]
    fn test_save_incomplete() {
        let (client, _) = setup();
        let user = User::new(&client, "subscriber").with_password("password");
        let mut subscription = Subscription::for_user(&client, user, SportKind::Boxing);
        assert!(matches!(
            subscription.save().unwrap_err(),
            Error::IncompleteInformation(_)
        ));
    }
}
