//! Activity entries logged under a subscription
//!
//! An entry's id is assigned by the service when it is created; until then
//! it has no URL and `save` creates it with a POST to the subscription.

use std::fmt;

use chrono::NaiveDate;

use super::document::EntryDocument;
use super::{check_write, not_saved, Resource, Subscription, SubscriptionOwner, User};
use crate::client::Client;
use crate::domain::result::{Error, Result};
use crate::domain::{uri, Payload, SportKind};
use crate::services::CredentialResolver;

/// Course of a running or cycling entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Course {
    pub courselength: Option<u32>,
    pub coursetype: Option<String>,
    pub track: Option<String>,
}

/// Fields that only exist for some sports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SportDetails {
    Running {
        numberofrounds: Option<u32>,
        course: Course,
    },
    Cycling {
        numberofrounds: Option<u32>,
        course: Course,
        bicycletype: Option<String>,
    },
    Boxing {
        numberofrounds: Option<u32>,
        roundduration: Option<u32>,
    },
    Soccer,
}

impl SportDetails {
    /// Empty details for `sport`
    pub fn for_sport(sport: SportKind) -> Self {
        match sport {
            SportKind::Running => SportDetails::Running {
                numberofrounds: None,
                course: Course::default(),
            },
            SportKind::Cycling => SportDetails::Cycling {
                numberofrounds: None,
                course: Course::default(),
                bicycletype: None,
            },
            SportKind::Boxing => SportDetails::Boxing {
                numberofrounds: None,
                roundduration: None,
            },
            SportKind::Soccer => SportDetails::Soccer,
        }
    }

    fn from_document(sport: SportKind, document: &EntryDocument) -> Self {
        let course = || Course {
            courselength: document.courselength,
            coursetype: document.coursetype.clone(),
            track: document.track.clone(),
        };
        match sport {
            SportKind::Running => SportDetails::Running {
                numberofrounds: document.numberofrounds,
                course: course(),
            },
            SportKind::Cycling => SportDetails::Cycling {
                numberofrounds: document.numberofrounds,
                course: course(),
                bicycletype: document.bicycletype.clone(),
            },
            SportKind::Boxing => SportDetails::Boxing {
                numberofrounds: document.numberofrounds,
                roundduration: document.roundduration,
            },
            SportKind::Soccer => SportDetails::Soccer,
        }
    }

    pub fn numberofrounds(&self) -> Option<u32> {
        match self {
            SportDetails::Running { numberofrounds, .. }
            | SportDetails::Cycling { numberofrounds, .. }
            | SportDetails::Boxing { numberofrounds, .. } => *numberofrounds,
            SportDetails::Soccer => None,
        }
    }

    /// Set the number of rounds; ignored for soccer
    pub fn set_numberofrounds(&mut self, rounds: Option<u32>) {
        match self {
            SportDetails::Running { numberofrounds, .. }
            | SportDetails::Cycling { numberofrounds, .. }
            | SportDetails::Boxing { numberofrounds, .. } => *numberofrounds = rounds,
            SportDetails::Soccer => {}
        }
    }

    pub fn course(&self) -> Option<&Course> {
        match self {
            SportDetails::Running { course, .. } | SportDetails::Cycling { course, .. } => Some(course),
            _ => None,
        }
    }

    pub fn course_mut(&mut self) -> Option<&mut Course> {
        match self {
            SportDetails::Running { course, .. } | SportDetails::Cycling { course, .. } => Some(course),
            _ => None,
        }
    }

    fn write(&self, payload: &mut Payload) {
        payload.push("numberofrounds", self.numberofrounds());
        if let SportDetails::Boxing { roundduration, .. } = self {
            payload.push("roundduration", *roundduration);
        }
        if let Some(course) = self.course() {
            payload.push("courselength", course.courselength);
            payload.push("coursetype", course.coursetype.as_deref());
            payload.push("track", course.track.as_deref());
        }
        if let SportDetails::Cycling { bicycletype, .. } = self {
            payload.push("bicycletype", bicycletype.as_deref());
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entry {
    client: Client,
    subscription: Subscription,
    id: Option<u64>,
    datecreated: Option<i64>,
    datemodified: Option<i64>,
    pub publicvisible: Option<u8>,
    pub comment: Option<String>,
    pub entrydate: Option<NaiveDate>,
    /// Duration in seconds
    pub entryduration: Option<u32>,
    pub entrylocation: Option<String>,
    pub details: SportDetails,
}

impl Entry {
    /// A new entry of `subscription`, not yet created on the service
    pub fn new(subscription: &Subscription) -> Self {
        Self {
            client: subscription.client().clone(),
            subscription: subscription.identity(),
            id: None,
            datecreated: None,
            datemodified: None,
            publicvisible: None,
            comment: None,
            entrydate: None,
            entryduration: None,
            entrylocation: None,
            details: SportDetails::for_sport(subscription.sport()),
        }
    }

    /// Refer to an existing entry by its id
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn datecreated(&self) -> Option<i64> {
        self.datecreated
    }

    pub fn datemodified(&self) -> Option<i64> {
        self.datemodified
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    pub fn sport(&self) -> SportKind {
        self.subscription.sport()
    }

    /// URL of the entry; `None` until it has been created
    pub fn url(&self) -> Option<String> {
        self.id
            .map(|id| format!("{}/{}", self.subscription.url(), id))
    }

    /// The identity writes are performed as
    ///
    /// The owning user, or for a partnership subscription the first member
    /// that authenticates. When neither member does, user2 is returned
    /// anyway and the write performed with it is what fails.
    pub fn acting_user(&self) -> Result<User> {
        match self.subscription.owner() {
            SubscriptionOwner::User(user) => Ok(user.clone()),
            SubscriptionOwner::Partnership(partnership) => {
                let members = [partnership.user1(), partnership.user2()];
                let user = CredentialResolver::new(&self.client).resolve_or_last(&members)?;
                Ok(user.clone())
            }
        }
    }

    /// Acting user, checked against the service
    fn authorized_user(&self) -> Result<User> {
        let user = self.acting_user()?;
        if !self.client.authenticated(user.credential())? {
            return Err(Error::unauthorized_as(&user));
        }
        Ok(user)
    }

    /// Fetch the entry's attributes
    pub fn update(&mut self) -> Result<()> {
        let url = self.url().ok_or_else(|| Error::not_found(self.subscription.url()))?;
        if !self.exist()? {
            return Err(Error::not_found(url));
        }
        let credential = self.read_credential()?;
        let body = self.client.get(&url, credential.as_ref())?.to_value()?;

        // Single entries come wrapped in their sport-qualified tag
        let tag = self.sport().entry_tag();
        let inner = body.get(tag.as_str()).cloned().unwrap_or(body);
        let document: EntryDocument = serde_json::from_value(inner)?;

        self.datecreated = document.datecreated;
        self.datemodified = document.datemodified;
        self.publicvisible = document.publicvisible;
        self.comment = document.comment.clone();
        self.entrydate = document.entrydate;
        self.entryduration = document.entryduration;
        self.entrylocation = document.entrylocation.clone();
        self.details = SportDetails::from_document(self.sport(), &document);
        Ok(())
    }

    fn payload(&self) -> Payload {
        let mut payload = Payload::new(self.sport().entry_tag())
            .field("publicvisible", self.publicvisible)
            .field("comment", self.comment.as_deref())
            .field("entrydate", self.entrydate.map(|d| d.format("%Y-%m-%d")))
            .field("entryduration", self.entryduration)
            .field("entrylocation", self.entrylocation.as_deref());
        self.details.write(&mut payload);
        payload
    }

    /// Create the entry under its subscription; the id comes from the
    /// `Location` of the response
    pub fn create(&mut self) -> Result<()> {
        let user = self.authorized_user()?;
        let response = self
            .client
            .post(&self.subscription.url(), Some(user.credential()), &self.payload())
            .map_err(|e| e.with_user(&user))?;
        check_write(response.status(), &*self, not_saved)?;

        let location = response
            .header("location")
            .ok_or_else(|| Error::Decode("created entry without Location header".to_string()))?;
        self.id = Some(uri::entry_id(location)?);
        tracing::info!(subscription = %self.subscription, id = ?self.id, "entry created");
        Ok(())
    }

    /// Create the entry if it has no id yet, otherwise overwrite it
    pub fn save(&mut self) -> Result<()> {
        let Some(url) = self.url() else {
            return self.create();
        };
        let user = self.authorized_user()?;
        let response = self
            .client
            .put(&url, Some(user.credential()), &self.payload())
            .map_err(|e| e.with_user(&user))?;
        check_write(response.status(), &*self, not_saved)?;
        tracing::info!(subscription = %self.subscription, id = ?self.id, "entry saved");
        Ok(())
    }

    pub fn delete(&self) -> Result<bool> {
        let url = match self.url() {
            Some(url) if self.exist()? => url,
            Some(url) => return Err(Error::not_found(url)),
            None => return Err(Error::not_found(self.subscription.url())),
        };
        let user = self.authorized_user()?;
        self.client
            .delete(&url, Some(user.credential()))
            .map_err(|e| e.with_user(&user))?;
        tracing::info!(subscription = %self.subscription, id = ?self.id, "entry deleted");
        Ok(true)
    }
}

impl Resource for Entry {
    fn client(&self) -> &Client {
        &self.client
    }

    fn location(&self) -> Option<String> {
        self.url()
    }

    fn readers(&self) -> Vec<&User> {
        self.subscription.owner().members()
    }
}

/// The entry id, empty while the entry has not been created
impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{}", id),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::memory::InMemoryCoach;
    use crate::resources::Partnership;

    fn setup() -> (Client, Arc<InMemoryCoach>) {
        let service = Arc::new(InMemoryCoach::seeded());
        let client = Client::new("http://coach.test", "/CyberCoachServer/resources/", service.clone());
        (client, service)
    }

    fn running(client: &Client) -> Subscription {
        let user = User::new(client, "user123").with_password("test123");
        Subscription::for_user(client, user, SportKind::Running)
    }

    #[test]
    fn test_new_entry_has_no_url() {
        let (client, service) = setup();
        let entry = running(&client).new_entry();
        assert_eq!(entry.url(), None);
        let before = service.request_count();
        assert!(!entry.exist().unwrap());
        assert_eq!(service.request_count(), before);
    }

    #[test]
    fn test_display_is_the_id() {
        let (client, _) = setup();
        let subscription = running(&client);
        assert_eq!(subscription.new_entry().to_string(), "");
        assert_eq!(subscription.new_entry().with_id(5).to_string(), "5");
    }

    #[test]
    fn test_details_follow_sport() {
        let (client, _) = setup();
        let user = User::new(&client, "user123");
        let soccer = Subscription::for_user(&client, &user, SportKind::Soccer).new_entry();
        assert_eq!(soccer.details, SportDetails::Soccer);
        assert_eq!(soccer.details.numberofrounds(), None);

        let cycling = Subscription::for_user(&client, &user, SportKind::Cycling).new_entry();
        assert!(cycling.details.course().is_some());
    }

    #[test]
    fn test_payload_uses_sport_tag() {
        let (client, _) = setup();
        let mut entry = running(&client).new_entry();
        entry.entryduration = Some(3600);
        entry.entrydate = NaiveDate::from_ymd_opt(2015, 3, 2);
        entry.comment = Some(String::new());
        entry.details.set_numberofrounds(Some(3));
        if let Some(course) = entry.details.course_mut() {
            course.track = Some("Lakeside".to_string());
        }

        let payload = entry.payload();
        assert_eq!(payload.tag(), "entryrunning");
        assert_eq!(payload.get("entrydate"), Some("2015-03-02"));
        assert_eq!(payload.get("numberofrounds"), Some("3"));
        assert_eq!(payload.get("track"), Some("Lakeside"));
        assert_eq!(payload.get("comment"), None);
        assert_eq!(payload.get("bicycletype"), None);
    }

    #[test]
    fn test_create_update_delete() {
        let (client, _) = setup();
        let mut entry = running(&client).new_entry();
        entry.publicvisible = Some(2);
        entry.entryduration = Some(1800);
        entry.entrylocation = Some("Fribourg".to_string());

        entry.save().unwrap();
        assert!(entry.id().is_some());
        assert!(entry.exist().unwrap());

        entry.comment = Some("Felt great".to_string());
        entry.save().unwrap();

        let mut fetched = running(&client).new_entry().with_id(entry.id().unwrap());
        fetched.update().unwrap();
        assert_eq!(fetched.comment.as_deref(), Some("Felt great"));
        assert_eq!(fetched.entryduration, Some(1800));

        assert!(entry.delete().unwrap());
        assert!(!entry.exist().unwrap());
    }

    #[test]
    fn test_create_incomplete() {
        let (client, _) = setup();
        let mut entry = running(&client).new_entry();
        entry.comment = Some("no duration".to_string());
        assert!(matches!(entry.save().unwrap_err(), Error::IncompleteInformation(_)));
        assert!(entry.id().is_none());
    }

    #[test]
    fn test_acting_user_falls_back_to_user2() {
        let (client, service) = setup();
        let partnership = Partnership::new(
            &client,
            User::new(&client, "user123").with_password("wrong"),
            User::new(&client, "user321").with_password("also wrong"),
        );
        let subscription = Subscription::for_partnership(&client, partnership, SportKind::Running);
        let mut entry = subscription.new_entry();

        assert_eq!(entry.acting_user().unwrap().username(), "user321");

        entry.entryduration = Some(60);
        entry.publicvisible = Some(2);
        let before = service.entry_count();
        match entry.save().unwrap_err() {
            Error::Unauthorized { user: Some(user) } => assert_eq!(user.username(), "user321"),
            other => panic!("expected Unauthorized, got {:?}", other),
        }
        assert_eq!(service.entry_count(), before);
    }

    #[test]
    fn test_partnership_entry_as_first_member() {
        let (client, _) = setup();
        let partnership = Partnership::new(
            &client,
            User::new(&client, "user123").with_password("test123"),
            User::new(&client, "user321"),
        );
        let subscription = Subscription::for_partnership(&client, partnership, SportKind::Running);
        let mut entry = subscription.new_entry();
        assert_eq!(entry.acting_user().unwrap().username(), "user123");

        entry.entryduration = Some(600);
        entry.publicvisible = Some(2);
        entry.save().unwrap();
        assert!(entry.exist().unwrap());
    }

    #[test]
    fn test_delete_unknown() {
        let (client, _) = setup();
        let entry = running(&client).new_entry().with_id(999_999);
        assert!(entry.delete().unwrap_err().is_not_found());
    }
}
