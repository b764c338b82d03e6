use std::fmt;

use serde_json::Value as JsonValue;

use super::document::SportDocument;
use super::Resource;
use crate::client::Client;
use crate::domain::result::{Error, Result};
use crate::domain::{uri, SportKind};
use crate::services::listing::{self, ListOptions, Listable};

/// A sport offered by the service; read-only
#[derive(Debug, Clone)]
pub struct Sport {
    client: Client,
    kind: SportKind,
    id: Option<u64>,
    name: Option<String>,
    description: Option<String>,
}

impl Sport {
    pub fn new(client: &Client, kind: SportKind) -> Self {
        Self {
            client: client.clone(),
            kind,
            id: None,
            name: None,
            description: None,
        }
    }

    pub fn kind(&self) -> SportKind {
        self.kind
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn url(&self) -> String {
        self.client
            .resource_url(&format!("{}{}", <Self as Listable>::PATH, self.kind))
    }

    /// Fetch the sport; sports are always read anonymously
    pub fn update(&mut self) -> Result<()> {
        let document: SportDocument = self.client.get(&self.url(), None)?.json()?;
        self.id = document.id;
        self.name = document.name;
        self.description = document.description;
        Ok(())
    }

    pub fn total(client: &Client) -> Result<usize> {
        listing::total::<Self>(client)
    }

    pub fn list(client: &Client, options: ListOptions) -> Result<Vec<Self>> {
        listing::list(client, options)
    }
}

impl Resource for Sport {
    fn client(&self) -> &Client {
        &self.client
    }

    fn location(&self) -> Option<String> {
        Some(self.url())
    }
}

impl Listable for Sport {
    const PATH: &'static str = "sports/";
    const COLLECTION: &'static str = "sports";

    fn from_item(client: &Client, item: &JsonValue) -> Result<Self> {
        let key = match item.get("name").and_then(JsonValue::as_str) {
            Some(name) => name.to_string(),
            None => item
                .get("uri")
                .and_then(JsonValue::as_str)
                .ok_or_else(|| Error::Decode("sport item without name or uri".to_string()))
                .and_then(uri::last_segment)?,
        };
        Ok(Self::new(client, key.parse()?))
    }
}

impl PartialEq for Sport {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for Sport {}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryCoach;

    fn client() -> Client {
        Client::new("http://coach.test", "/CyberCoachServer/resources/", InMemoryCoach::shared())
    }

    #[test]
    fn test_url() {
        let sport = Sport::new(&client(), SportKind::Boxing);
        assert_eq!(sport.url(), "http://coach.test/CyberCoachServer/resources/sports/boxing");
        assert_eq!(sport.to_string(), "boxing");
    }

    #[test]
    fn test_update() {
        let mut sport = Sport::new(&client(), SportKind::Running);
        sport.update().unwrap();
        assert_eq!(sport.name(), Some("Running"));
        assert!(sport.id().is_some());
        assert!(sport.description().is_some());
    }

    #[test]
    fn test_exist() {
        assert!(Sport::new(&client(), SportKind::Soccer).exist().unwrap());
    }

    #[test]
    fn test_list_all_sports() {
        let client = client();
        let sports = Sport::list(&client, ListOptions::everything()).unwrap();
        assert_eq!(sports.len(), Sport::total(&client).unwrap());
        assert_eq!(sports.len(), SportKind::ALL.len());
    }
}
