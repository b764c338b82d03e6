//! Listing and pagination
//!
//! Collections (`users/`, `partnerships/`, `sports/`) are paged with
//! `start`/`size` query parameters and report the number of items they hold
//! in `available`. Listed items are identified from their URI only; callers
//! `update` them separately to fetch their attributes.

use serde_json::Value as JsonValue;

use crate::client::Client;
use crate::domain::result::{Error, Result};
use crate::ports::{HttpRequest, Method};

/// Page size used when none is given
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Window of a listing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub size: usize,
    pub start: usize,
    /// Retrieve everything in chunks of the client's list-all size,
    /// ignoring `size` and `start`
    pub all: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            size: DEFAULT_PAGE_SIZE,
            start: 0,
            all: false,
        }
    }
}

impl ListOptions {
    /// Options for a complete scan
    pub fn everything() -> Self {
        Self {
            all: true,
            ..Self::default()
        }
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn start(mut self, start: usize) -> Self {
        self.start = start;
        self
    }

    pub fn all(mut self, all: bool) -> Self {
        self.all = all;
        self
    }

    /// The `(start, size)` window of the first request
    pub(crate) fn window(&self, client: &Client) -> (usize, usize) {
        if self.all {
            (0, client.list_all_size())
        } else {
            (self.start, self.size)
        }
    }
}

/// A resource that can be listed from a top-level collection
pub trait Listable: Sized {
    /// Collection path relative to the service root, e.g. `users/`
    const PATH: &'static str;

    /// Key of the item array in a collection response
    const COLLECTION: &'static str;

    /// Build an identified (not yet updated) resource from a list item
    fn from_item(client: &Client, item: &JsonValue) -> Result<Self>;
}

/// Number of items in the collection
pub fn total<T: Listable>(client: &Client) -> Result<usize> {
    let page = fetch_page::<T>(client, 0, 0)?;
    page.get("available")
        .and_then(JsonValue::as_u64)
        .map(|n| n as usize)
        .ok_or_else(|| Error::Decode(format!("no 'available' count in {}", T::PATH)))
}

/// List the collection
pub fn list<T: Listable>(client: &Client, options: ListOptions) -> Result<Vec<T>> {
    list_where(client, options, |_| true)
}

/// List the collection, keeping only items accepted by `keep`
///
/// The predicate filters the output only: rejected items still advance the
/// scan, so the server-side windows are the same with or without it.
pub fn list_where<T, F>(client: &Client, options: ListOptions, mut keep: F) -> Result<Vec<T>>
where
    T: Listable,
    F: FnMut(&T) -> bool,
{
    let total = if options.all {
        Some(total::<T>(client)?)
    } else {
        None
    };
    let (mut start, size) = options.window(client);
    let mut items = Vec::new();

    loop {
        let page = fetch_page::<T>(client, start, size)?;
        let entries = page
            .get(T::COLLECTION)
            .and_then(JsonValue::as_array)
            .ok_or_else(|| Error::Decode(format!("no '{}' list in {}", T::COLLECTION, T::PATH)))?;

        for entry in entries {
            let item = T::from_item(client, entry)?;
            if keep(&item) {
                items.push(item);
            }
        }

        let Some(total) = total else { break };
        start += size;
        if start >= total {
            break;
        }
    }

    tracing::debug!(collection = T::PATH, count = items.len(), "listed");
    Ok(items)
}

fn fetch_page<T: Listable>(client: &Client, start: usize, size: usize) -> Result<JsonValue> {
    let request = HttpRequest::new(Method::Get, client.resource_url(T::PATH))
        .query("start", start)
        .query("size", size);
    client.get_request(request)?.to_value()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::memory::InMemoryCoach;
    use crate::resources::User;

    fn setup(users: usize) -> (Client, Arc<InMemoryCoach>) {
        let service = Arc::new(InMemoryCoach::new());
        for i in 0..users {
            service.add_user(&format!("athlete{:03}", i), "secret", 2);
        }
        let client = Client::new("http://coach.test", "/resources/", service.clone());
        (client, service)
    }

    #[test]
    fn test_default_options() {
        let options = ListOptions::default();
        assert_eq!(options.size, 20);
        assert_eq!(options.start, 0);
        assert!(!options.all);
        assert!(ListOptions::everything().all);
    }

    #[test]
    fn test_total() {
        let (client, _) = setup(7);
        assert_eq!(total::<User>(&client).unwrap(), 7);
    }

    #[test]
    fn test_single_window() {
        let (client, _) = setup(30);
        let users: Vec<User> = list(&client, ListOptions::default().size(5).start(2)).unwrap();
        let names: Vec<&str> = users.iter().map(User::username).collect();
        assert_eq!(names, ["athlete002", "athlete003", "athlete004", "athlete005", "athlete006"]);
    }

    #[test]
    fn test_all_walks_every_chunk() {
        let (client, service) = setup(25);
        let client = client.with_list_all_size(10);

        let before = service.request_count();
        let users: Vec<User> = list(&client, ListOptions::everything()).unwrap();
        assert_eq!(users.len(), 25);
        // one total request plus three chunks
        assert_eq!(service.request_count(), before + 4);
    }

    #[test]
    fn test_filter_does_not_change_windows() {
        let (client, service) = setup(25);
        let client = client.with_list_all_size(10);

        let before = service.request_count();
        let users: Vec<User> = list_where(&client, ListOptions::everything(), |u: &User| {
            u.username().ends_with('7')
        })
        .unwrap();
        let names: Vec<&str> = users.iter().map(User::username).collect();
        assert_eq!(names, ["athlete007", "athlete017"]);
        assert_eq!(service.request_count(), before + 4);
    }

    #[test]
    fn test_all_on_empty_collection() {
        let (client, _) = setup(0);
        let users: Vec<User> = list(&client, ListOptions::everything()).unwrap();
        assert!(users.is_empty());
    }
}
