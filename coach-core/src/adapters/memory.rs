//! In-memory CyberCoach service
//!
//! Implements [`Transport`] by answering requests from a local data set,
//! with the same response shapes and status codes as the real service:
//!
//! - `GET authenticateduser/` answers 200 for a valid credential, 401 otherwise
//! - reads of hidden resources answer 401 (anonymous) or 403 (authenticated)
//! - creating a resource without its required fields answers 409
//! - collections page with `start`/`size` and link to the `next` page
//!
//! Visibility follows `publicvisible`: 2 is public, 1 is visible to any
//! authenticated user, 0 only to the owners. Requests with an invalid
//! credential are treated as anonymous, so a new user can be registered
//! with the credential it is about to own.
//!
//! Used by the test suites and by demo mode.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{json, Value as JsonValue};
use url::Url;

use crate::domain::result::{Error, Result};
use crate::domain::SportKind;
use crate::ports::{HttpRequest, HttpResponse, Method, Transport};
use crate::services::DEFAULT_PAGE_SIZE;

/// First segments the service routes on
const COLLECTIONS: [&str; 4] = ["authenticateduser", "users", "partnerships", "sports"];

/// 2015-01-01T00:00:00Z; the clock advances one minute per write
const EPOCH_MILLIS: i64 = 1_420_070_400_000;

const SPORTS: [(SportKind, u64, &str, &str); 4] = [
    (SportKind::Running, 1, "Running", "Running on a track or outdoors"),
    (SportKind::Cycling, 2, "Cycling", "Road and mountain biking"),
    (SportKind::Boxing, 3, "Boxing", "Sparring and bag work in rounds"),
    (SportKind::Soccer, 4, "Soccer", "Eleven-a-side or five-a-side football"),
];

#[derive(Debug, Clone)]
struct StoredUser {
    password: String,
    realname: String,
    email: String,
    publicvisible: u8,
    datecreated: i64,
}

#[derive(Debug, Clone)]
struct StoredPartnership {
    id: u64,
    datecreated: i64,
    publicvisible: u8,
    confirmed1: bool,
    confirmed2: bool,
}

/// Owner of a subscription, partnerships in stored member order
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Owner {
    User(String),
    Partnership(String, String),
}

impl Owner {
    fn members(&self) -> Vec<&str> {
        match self {
            Owner::User(name) => vec![name.as_str()],
            Owner::Partnership(user1, user2) => vec![user1.as_str(), user2.as_str()],
        }
    }

    fn path(&self) -> String {
        match self {
            Owner::User(name) => format!("users/{}", name),
            Owner::Partnership(user1, user2) => format!("partnerships/{};{}", user1, user2),
        }
    }
}

#[derive(Debug, Clone)]
struct StoredSubscription {
    id: u64,
    datesubscribed: i64,
    publicvisible: u8,
}

#[derive(Debug, Clone)]
struct StoredEntry {
    owner: Owner,
    sport: SportKind,
    datecreated: i64,
    datemodified: i64,
    fields: BTreeMap<String, String>,
}

impl StoredEntry {
    fn publicvisible(&self) -> u8 {
        self.fields
            .get("publicvisible")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<String, StoredUser>,
    partnerships: BTreeMap<(String, String), StoredPartnership>,
    subscriptions: BTreeMap<(Owner, SportKind), StoredSubscription>,
    entries: BTreeMap<u64, StoredEntry>,
    next_id: u64,
    clock: i64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn tick(&mut self) -> i64 {
        self.clock += 60_000;
        EPOCH_MILLIS + self.clock
    }

    /// Username of a valid credential on the request
    fn authenticate(&self, request: &HttpRequest) -> Option<String> {
        let credential = request.credential.as_ref()?;
        let user = self.users.get(&credential.username)?;
        (credential.password.as_deref() == Some(user.password.as_str()))
            .then(|| credential.username.clone())
    }

    /// Stored key of the partnership between two users, in either order
    fn partnership_key(&self, a: &str, b: &str) -> Option<(String, String)> {
        let forward = (a.to_string(), b.to_string());
        if self.partnerships.contains_key(&forward) {
            return Some(forward);
        }
        let backward = (b.to_string(), a.to_string());
        self.partnerships.contains_key(&backward).then_some(backward)
    }

    fn remove_owned_by(&mut self, owner: &Owner) {
        self.subscriptions.retain(|(o, _), _| o != owner);
        self.entries.retain(|_, entry| &entry.owner != owner);
    }

    fn add_user(&mut self, name: &str, password: &str, realname: &str, publicvisible: u8) {
        let datecreated = self.tick();
        self.users.insert(
            name.to_string(),
            StoredUser {
                password: password.to_string(),
                realname: realname.to_string(),
                email: format!("{}@example.com", name),
                publicvisible,
                datecreated,
            },
        );
    }

    fn add_partnership(&mut self, user1: &str, user2: &str) {
        let id = self.next_id();
        let datecreated = self.tick();
        self.partnerships.insert(
            (user1.to_string(), user2.to_string()),
            StoredPartnership {
                id,
                datecreated,
                publicvisible: 2,
                confirmed1: true,
                confirmed2: true,
            },
        );
    }

    fn add_subscription(&mut self, owner: Owner, sport: SportKind) {
        let id = self.next_id();
        let datesubscribed = self.tick();
        self.subscriptions.insert(
            (owner, sport),
            StoredSubscription {
                id,
                datesubscribed,
                publicvisible: 2,
            },
        );
    }

    fn add_entry(&mut self, owner: Owner, sport: SportKind, duration: u32, comment: &str) {
        let id = self.next_id();
        let now = self.tick();
        let fields = BTreeMap::from([
            ("publicvisible".to_string(), "2".to_string()),
            ("entryduration".to_string(), duration.to_string()),
            ("entrydate".to_string(), "2015-03-02".to_string()),
            ("comment".to_string(), comment.to_string()),
        ]);
        self.entries.insert(
            id,
            StoredEntry {
                owner,
                sport,
                datecreated: now,
                datemodified: now,
                fields,
            },
        );
    }
}

/// Per-request routing context
struct Ctx<'a> {
    method: Method,
    /// Path of the resource root, e.g. `/CyberCoachServer/resources/`
    base: String,
    authed: Option<String>,
    start: usize,
    size: usize,
    body: Option<&'a str>,
}

impl Ctx<'_> {
    fn uri(&self, relative: &str) -> String {
        format!("{}{}/", self.base, relative)
    }

    fn can_read(&self, publicvisible: u8, members: &[&str]) -> bool {
        match publicvisible {
            2 => true,
            1 => self.authed.is_some(),
            _ => self.is_member(members),
        }
    }

    fn is_member(&self, members: &[&str]) -> bool {
        self.authed
            .as_deref()
            .is_some_and(|name| members.contains(&name))
    }

    /// 401 when no identity was established, 403 when it lacks access
    fn deny(&self) -> HttpResponse {
        HttpResponse::new(if self.authed.is_some() { 403 } else { 401 }, "")
    }

    /// Window `[start, end)` of a list of `total` items
    fn window(&self, total: usize) -> (usize, usize) {
        let start = self.start.min(total);
        (start, (start + self.size).min(total))
    }

    fn links(&self, href: &str, total: usize) -> JsonValue {
        let (start, end) = self.window(total);
        let mut links = Vec::new();
        if start > 0 {
            let previous = start.saturating_sub(self.size);
            links.push(json!({
                "href": format!("{}?start={}&size={}", href, previous, self.size),
                "description": "previous",
            }));
        }
        if end < total && self.size > 0 {
            links.push(json!({
                "href": format!("{}?start={}&size={}", href, end, self.size),
                "description": "next",
            }));
        }
        JsonValue::Array(links)
    }

    /// Write payload as `(root tag, fields)`
    fn payload(&self) -> Option<(String, BTreeMap<String, String>)> {
        parse_xml(self.body?)
    }
}

fn json_response(status: u16, value: JsonValue) -> HttpResponse {
    HttpResponse::new(status, value.to_string()).with_header("Content-Type", "application/json")
}

fn status(status: u16) -> HttpResponse {
    HttpResponse::new(status, "")
}

/// Flat `<root><field>value</field>...</root>` documents only
fn parse_xml(body: &str) -> Option<(String, BTreeMap<String, String>)> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut root = None;
    let mut current: Option<String> = None;
    let mut fields = BTreeMap::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
                if root.is_none() {
                    root = Some(name);
                } else {
                    current = Some(name);
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(name) = &current {
                    let value = text.unescape().ok()?.into_owned();
                    fields.insert(name.clone(), value);
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return None,
        }
    }
    Some((root?, fields))
}

fn parse_visibility(fields: &BTreeMap<String, String>) -> Option<u8> {
    fields.get("publicvisible").and_then(|v| v.trim().parse().ok())
}

/// In-memory stand-in for the CyberCoach service
#[derive(Debug)]
pub struct InMemoryCoach {
    state: Mutex<State>,
    requests: Mutex<Vec<String>>,
}

impl Default for InMemoryCoach {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCoach {
    /// A service with the sports and no users
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A service with a small community of users, partnerships and entries
    ///
    /// | username   | password |
    /// |------------|----------|
    /// | user123    | test123  |
    /// | user321    | test321  |
    /// | partner1-3 | password |
    /// | nopartner  | password |
    /// | subscriber | password |
    ///
    /// `user123;user321` and `partner1;partner2` are operational.
    pub fn seeded() -> Self {
        let service = Self::new();
        if let Ok(mut state) = service.state.lock() {
            state.add_user("user123", "test123", "User 123", 2);
            state.add_user("user321", "test321", "User 321", 2);
            state.add_user("partner1", "password", "Partner One", 2);
            state.add_user("partner2", "password", "Partner Two", 2);
            state.add_user("partner3", "password", "Partner Three", 2);
            state.add_user("nopartner", "password", "No Partner", 1);
            state.add_user("subscriber", "password", "Sub Scriber", 2);

            state.add_partnership("user123", "user321");
            state.add_partnership("partner1", "partner2");

            let user123 = Owner::User("user123".to_string());
            let pair = Owner::Partnership("user123".to_string(), "user321".to_string());
            state.add_subscription(user123.clone(), SportKind::Running);
            state.add_subscription(Owner::User("user321".to_string()), SportKind::Cycling);
            state.add_subscription(Owner::User("subscriber".to_string()), SportKind::Running);
            state.add_subscription(pair.clone(), SportKind::Running);

            state.add_entry(user123.clone(), SportKind::Running, 1800, "Morning run");
            state.add_entry(user123.clone(), SportKind::Running, 2700, "Intervals");
            state.add_entry(user123, SportKind::Running, 5400, "Long run");
            state.add_entry(pair, SportKind::Running, 3600, "Run together");
        }
        service
    }

    /// A seeded service behind an `Arc`, ready to hand to a client
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::seeded())
    }

    /// Register a user directly, bypassing the protocol
    pub fn add_user(&self, username: &str, password: &str, publicvisible: u8) {
        if let Ok(mut state) = self.state.lock() {
            state.add_user(username, password, username, publicvisible);
        }
    }

    /// Number of requests served so far
    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|log| log.len()).unwrap_or(0)
    }

    /// Served requests as `METHOD url`, oldest first
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Number of stored entries across all subscriptions
    pub fn entry_count(&self) -> usize {
        self.state.lock().map(|state| state.entries.len()).unwrap_or(0)
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::Transport("in-memory service state poisoned".to_string()))
    }

    fn dispatch(&self, state: &mut State, ctx: &Ctx, segments: &[String]) -> HttpResponse {
        match segments {
            [collection] if collection == "authenticateduser" => match &ctx.authed {
                Some(name) if ctx.method == Method::Get => json_response(
                    200,
                    json!({ "username": name, "uri": ctx.uri(&format!("users/{}", name)) }),
                ),
                Some(_) => status(405),
                None => status(401),
            },
            [collection] if collection == "users" => self.list_users(state, ctx),
            [collection, name] if collection == "users" => self.user(state, ctx, name),
            [collection, name, rest @ ..] if collection == "users" => {
                if !state.users.contains_key(name) {
                    return status(404);
                }
                self.owned(state, ctx, Owner::User(name.clone()), rest)
            }
            [collection] if collection == "partnerships" => self.list_partnerships(state, ctx),
            [collection, pair] if collection == "partnerships" => {
                match pair.split_once(';') {
                    Some((a, b)) => self.partnership(state, ctx, a, b),
                    None => status(404),
                }
            }
            [collection, pair, rest @ ..] if collection == "partnerships" => {
                let key = pair
                    .split_once(';')
                    .and_then(|(a, b)| state.partnership_key(a, b));
                match key {
                    Some((a, b)) => self.owned(state, ctx, Owner::Partnership(a, b), rest),
                    None => status(404),
                }
            }
            [collection] if collection == "sports" => self.list_sports(ctx),
            [collection, name] if collection == "sports" => self.sport(ctx, name),
            _ => status(404),
        }
    }

    fn owned(&self, state: &mut State, ctx: &Ctx, owner: Owner, rest: &[String]) -> HttpResponse {
        let sport = match rest.first().map(|s| s.parse::<SportKind>()) {
            Some(Ok(sport)) => sport,
            _ => return status(404),
        };
        match rest {
            [_] => self.subscription(state, ctx, owner, sport),
            [_, id] => match id.parse::<u64>() {
                Ok(id) => self.entry(state, ctx, owner, sport, id),
                Err(_) => status(404),
            },
            _ => status(404),
        }
    }

    // -- sports ---------------------------------------------------------------

    fn sport_json(ctx: &Ctx, sport: &(SportKind, u64, &str, &str)) -> JsonValue {
        let (kind, id, name, description) = sport;
        json!({
            "uri": ctx.uri(&format!("sports/{}", kind)),
            "id": id,
            "name": name,
            "description": description,
        })
    }

    fn list_sports(&self, ctx: &Ctx) -> HttpResponse {
        if ctx.method != Method::Get {
            return status(405);
        }
        let (start, end) = ctx.window(SPORTS.len());
        let sports: Vec<JsonValue> = SPORTS[start..end]
            .iter()
            .map(|sport| Self::sport_json(ctx, sport))
            .collect();
        json_response(
            200,
            json!({
                "start": start,
                "end": end,
                "available": SPORTS.len(),
                "sports": sports,
                "links": ctx.links(&ctx.uri("sports"), SPORTS.len()),
            }),
        )
    }

    fn sport(&self, ctx: &Ctx, name: &str) -> HttpResponse {
        if ctx.method != Method::Get {
            return status(405);
        }
        match SPORTS.iter().find(|(kind, ..)| kind.as_str() == name) {
            Some(sport) => json_response(200, Self::sport_json(ctx, sport)),
            None => status(404),
        }
    }

    // -- users ----------------------------------------------------------------

    fn list_users(&self, state: &State, ctx: &Ctx) -> HttpResponse {
        if ctx.method != Method::Get {
            return status(405);
        }
        let total = state.users.len();
        let (start, end) = ctx.window(total);
        let users: Vec<JsonValue> = state
            .users
            .keys()
            .skip(start)
            .take(end - start)
            .map(|name| json!({ "username": name, "uri": ctx.uri(&format!("users/{}", name)) }))
            .collect();
        json_response(
            200,
            json!({
                "start": start,
                "end": end,
                "available": total,
                "users": users,
                "links": ctx.links(&ctx.uri("users"), total),
            }),
        )
    }

    fn user_json(state: &State, ctx: &Ctx, name: &str, user: &StoredUser) -> JsonValue {
        let partnerships: Vec<String> = state
            .partnerships
            .keys()
            .filter(|(a, b)| a == name || b == name)
            .map(|(a, b)| ctx.uri(&format!("partnerships/{};{}", a, b)))
            .collect();
        let (start, end) = ctx.window(partnerships.len());
        let subscriptions: Vec<JsonValue> = state
            .subscriptions
            .keys()
            .filter(|(owner, _)| *owner == Owner::User(name.to_string()))
            .map(|(owner, sport)| json!({ "uri": ctx.uri(&format!("{}/{}", owner.path(), sport)) }))
            .collect();
        let href = ctx.uri(&format!("users/{}", name));

        json!({
            "uri": href,
            "username": name,
            "realname": user.realname,
            "email": user.email,
            "publicvisible": user.publicvisible,
            "datecreated": user.datecreated,
            "partnerships": partnerships[start..end]
                .iter()
                .map(|uri| json!({ "uri": uri }))
                .collect::<Vec<_>>(),
            "subscriptions": subscriptions,
            "links": ctx.links(&href, partnerships.len()),
        })
    }

    fn user(&self, state: &mut State, ctx: &Ctx, name: &str) -> HttpResponse {
        match ctx.method {
            Method::Get => match state.users.get(name) {
                Some(user) if ctx.can_read(user.publicvisible, &[name]) => {
                    json_response(200, Self::user_json(state, ctx, name, user))
                }
                Some(_) => ctx.deny(),
                None => status(404),
            },
            Method::Put => {
                let Some((_, fields)) = ctx.payload() else {
                    return status(400);
                };
                if state.users.contains_key(name) {
                    if !ctx.is_member(&[name]) {
                        return ctx.deny();
                    }
                    if let Some(user) = state.users.get_mut(name) {
                        if let Some(password) = fields.get("password") {
                            user.password = password.clone();
                        }
                        if let Some(realname) = fields.get("realname") {
                            user.realname = realname.clone();
                        }
                        if let Some(email) = fields.get("email") {
                            user.email = email.clone();
                        }
                        if let Some(publicvisible) = parse_visibility(&fields) {
                            user.publicvisible = publicvisible;
                        }
                    }
                    self.user_response(state, ctx, name, 200)
                } else {
                    let (Some(password), Some(realname), Some(email), Some(publicvisible)) = (
                        fields.get("password"),
                        fields.get("realname"),
                        fields.get("email"),
                        parse_visibility(&fields),
                    ) else {
                        return status(409);
                    };
                    let datecreated = state.tick();
                    state.users.insert(
                        name.to_string(),
                        StoredUser {
                            password: password.clone(),
                            realname: realname.clone(),
                            email: email.clone(),
                            publicvisible,
                            datecreated,
                        },
                    );
                    self.user_response(state, ctx, name, 201)
                }
            }
            Method::Delete => {
                if !state.users.contains_key(name) {
                    return status(404);
                }
                if !ctx.is_member(&[name]) {
                    return ctx.deny();
                }
                state.users.remove(name);
                let gone: Vec<(String, String)> = state
                    .partnerships
                    .keys()
                    .filter(|(a, b)| a == name || b == name)
                    .cloned()
                    .collect();
                for (a, b) in gone {
                    state.partnerships.remove(&(a.clone(), b.clone()));
                    state.remove_owned_by(&Owner::Partnership(a, b));
                }
                state.remove_owned_by(&Owner::User(name.to_string()));
                status(200)
            }
            Method::Post => status(405),
        }
    }

    fn user_response(&self, state: &State, ctx: &Ctx, name: &str, code: u16) -> HttpResponse {
        match state.users.get(name) {
            Some(user) => json_response(code, Self::user_json(state, ctx, name, user)),
            None => status(500),
        }
    }

    // -- partnerships ---------------------------------------------------------

    fn list_partnerships(&self, state: &State, ctx: &Ctx) -> HttpResponse {
        if ctx.method != Method::Get {
            return status(405);
        }
        let total = state.partnerships.len();
        let (start, end) = ctx.window(total);
        let partnerships: Vec<JsonValue> = state
            .partnerships
            .keys()
            .skip(start)
            .take(end - start)
            .map(|(a, b)| json!({ "uri": ctx.uri(&format!("partnerships/{};{}", a, b)) }))
            .collect();
        json_response(
            200,
            json!({
                "start": start,
                "end": end,
                "available": total,
                "partnerships": partnerships,
                "links": ctx.links(&ctx.uri("partnerships"), total),
            }),
        )
    }

    fn partnership_json(
        state: &State,
        ctx: &Ctx,
        key: &(String, String),
        partnership: &StoredPartnership,
    ) -> JsonValue {
        let (user1, user2) = key;
        let owner = Owner::Partnership(user1.clone(), user2.clone());
        let subscriptions: Vec<JsonValue> = state
            .subscriptions
            .keys()
            .filter(|(o, _)| *o == owner)
            .map(|(o, sport)| json!({ "uri": ctx.uri(&format!("{}/{}", o.path(), sport)) }))
            .collect();

        json!({
            "uri": ctx.uri(&owner.path()),
            "id": partnership.id,
            "datecreated": partnership.datecreated,
            "publicvisible": partnership.publicvisible,
            "user1": { "username": user1, "uri": ctx.uri(&format!("users/{}", user1)) },
            "user2": { "username": user2, "uri": ctx.uri(&format!("users/{}", user2)) },
            "userconfirmed1": partnership.confirmed1,
            "userconfirmed2": partnership.confirmed2,
            "subscriptions": subscriptions,
        })
    }

    fn partnership(&self, state: &mut State, ctx: &Ctx, a: &str, b: &str) -> HttpResponse {
        let existing = state.partnership_key(a, b);
        match ctx.method {
            Method::Get => {
                let Some(key) = existing else {
                    return status(404);
                };
                match state.partnerships.get(&key) {
                    Some(p) if ctx.can_read(p.publicvisible, &[key.0.as_str(), key.1.as_str()]) => {
                        json_response(200, Self::partnership_json(state, ctx, &key, p))
                    }
                    Some(_) => ctx.deny(),
                    None => status(404),
                }
            }
            Method::Put => {
                if !state.users.contains_key(a) || !state.users.contains_key(b) || a == b {
                    return status(404);
                }
                if !ctx.is_member(&[a, b]) {
                    return ctx.deny();
                }
                let fields = ctx.payload().map(|(_, fields)| fields).unwrap_or_default();
                let actor = ctx.authed.clone().unwrap_or_default();

                let (key, code) = match existing {
                    Some(key) => (key, 200),
                    None => {
                        let Some(publicvisible) = parse_visibility(&fields) else {
                            return status(409);
                        };
                        let key = (a.to_string(), b.to_string());
                        let id = state.next_id();
                        let datecreated = state.tick();
                        state.partnerships.insert(
                            key.clone(),
                            StoredPartnership {
                                id,
                                datecreated,
                                publicvisible,
                                confirmed1: false,
                                confirmed2: false,
                            },
                        );
                        (key, 201)
                    }
                };
                if let Some(partnership) = state.partnerships.get_mut(&key) {
                    if actor == key.0 {
                        partnership.confirmed1 = true;
                    } else {
                        partnership.confirmed2 = true;
                    }
                    if let Some(publicvisible) = parse_visibility(&fields) {
                        partnership.publicvisible = publicvisible;
                    }
                }
                self.partnership_response(state, ctx, &key, code)
            }
            Method::Delete => {
                let Some(key) = existing else {
                    return status(404);
                };
                if !ctx.is_member(&[key.0.as_str(), key.1.as_str()]) {
                    return ctx.deny();
                }
                let actor = ctx.authed.clone().unwrap_or_default();
                let Some(partnership) = state.partnerships.get_mut(&key) else {
                    return status(404);
                };
                if actor == key.0 {
                    partnership.confirmed1 = false;
                } else {
                    partnership.confirmed2 = false;
                }
                let snapshot = partnership.clone();
                let body = Self::partnership_json(state, ctx, &key, &snapshot);
                if !snapshot.confirmed1 && !snapshot.confirmed2 {
                    state.partnerships.remove(&key);
                    state.remove_owned_by(&Owner::Partnership(key.0, key.1));
                }
                json_response(200, body)
            }
            Method::Post => status(405),
        }
    }

    fn partnership_response(
        &self,
        state: &State,
        ctx: &Ctx,
        key: &(String, String),
        code: u16,
    ) -> HttpResponse {
        match state.partnerships.get(key) {
            Some(p) => json_response(code, Self::partnership_json(state, ctx, key, p)),
            None => status(500),
        }
    }

    /// Visibility of an owner, used as the floor for its subscriptions
    fn owner_visible(state: &State, ctx: &Ctx, owner: &Owner) -> bool {
        match owner {
            Owner::User(name) => state
                .users
                .get(name)
                .is_some_and(|u| ctx.can_read(u.publicvisible, &[name.as_str()])),
            Owner::Partnership(a, b) => state
                .partnerships
                .get(&(a.clone(), b.clone()))
                .is_some_and(|p| ctx.can_read(p.publicvisible, &[a.as_str(), b.as_str()])),
        }
    }

    // -- subscriptions --------------------------------------------------------

    fn subscription_json(
        state: &State,
        ctx: &Ctx,
        owner: &Owner,
        sport: SportKind,
        subscription: &StoredSubscription,
    ) -> JsonValue {
        let tag = sport.entry_tag();
        let href = ctx.uri(&format!("{}/{}", owner.path(), sport));
        let ids: Vec<u64> = state
            .entries
            .iter()
            .filter(|(_, e)| e.owner == *owner && e.sport == sport)
            .map(|(id, _)| *id)
            .collect();
        let (start, end) = ctx.window(ids.len());
        let entries: Vec<JsonValue> = ids[start..end]
            .iter()
            .map(|id| {
                let mut item = serde_json::Map::new();
                item.insert(
                    tag.clone(),
                    json!({ "id": id, "uri": ctx.uri(&format!("{}/{}/{}", owner.path(), sport, id)) }),
                );
                JsonValue::Object(item)
            })
            .collect();

        json!({
            "uri": href,
            "id": subscription.id,
            "datesubscribed": subscription.datesubscribed,
            "publicvisible": subscription.publicvisible,
            "sport": { "name": sport.as_str(), "uri": ctx.uri(&format!("sports/{}", sport)) },
            "entries": entries,
            "links": ctx.links(&href, ids.len()),
        })
    }

    fn subscription(&self, state: &mut State, ctx: &Ctx, owner: Owner, sport: SportKind) -> HttpResponse {
        let key = (owner.clone(), sport);
        let members = owner.members();
        match ctx.method {
            Method::Get => match state.subscriptions.get(&key) {
                Some(s) if ctx.can_read(s.publicvisible, &members) => {
                    json_response(200, Self::subscription_json(state, ctx, &owner, sport, s))
                }
                Some(_) => ctx.deny(),
                None => status(404),
            },
            Method::Put => {
                if !ctx.is_member(&members) {
                    return ctx.deny();
                }
                let fields = ctx.payload().map(|(_, fields)| fields).unwrap_or_default();
                let visibility = parse_visibility(&fields);
                let code = match state.subscriptions.get_mut(&key) {
                    Some(subscription) => {
                        if let Some(publicvisible) = visibility {
                            subscription.publicvisible = publicvisible;
                        }
                        200
                    }
                    None => {
                        let Some(publicvisible) = visibility else {
                            return status(409);
                        };
                        let id = state.next_id();
                        let datesubscribed = state.tick();
                        state.subscriptions.insert(
                            key.clone(),
                            StoredSubscription {
                                id,
                                datesubscribed,
                                publicvisible,
                            },
                        );
                        201
                    }
                };
                match state.subscriptions.get(&key) {
                    Some(s) => json_response(code, Self::subscription_json(state, ctx, &owner, sport, s)),
                    None => status(500),
                }
            }
            Method::Delete => {
                if !state.subscriptions.contains_key(&key) {
                    return status(404);
                }
                if !ctx.is_member(&members) {
                    return ctx.deny();
                }
                state.subscriptions.remove(&key);
                state
                    .entries
                    .retain(|_, e| !(e.owner == owner && e.sport == sport));
                status(200)
            }
            Method::Post => {
                if !state.subscriptions.contains_key(&key) {
                    return status(404);
                }
                if !ctx.is_member(&members) {
                    return ctx.deny();
                }
                let Some((tag, fields)) = ctx.payload() else {
                    return status(400);
                };
                if tag != sport.entry_tag() {
                    return status(400);
                }
                if !fields.contains_key("entryduration") || parse_visibility(&fields).is_none() {
                    return status(409);
                }
                let id = state.next_id();
                let now = state.tick();
                state.entries.insert(
                    id,
                    StoredEntry {
                        owner: owner.clone(),
                        sport,
                        datecreated: now,
                        datemodified: now,
                        fields,
                    },
                );
                let location = ctx.uri(&format!("{}/{}/{}", owner.path(), sport, id));
                HttpResponse::new(201, "").with_header("Location", location)
            }
        }
    }

    // -- entries --------------------------------------------------------------

    fn entry_json(ctx: &Ctx, id: u64, entry: &StoredEntry) -> JsonValue {
        let mut body = serde_json::Map::new();
        body.insert(
            "uri".to_string(),
            json!(ctx.uri(&format!("{}/{}/{}", entry.owner.path(), entry.sport, id))),
        );
        body.insert("id".to_string(), json!(id));
        body.insert("datecreated".to_string(), json!(entry.datecreated));
        body.insert("datemodified".to_string(), json!(entry.datemodified));
        for (name, value) in &entry.fields {
            body.insert(name.clone(), json!(value));
        }

        let mut wrapped = serde_json::Map::new();
        wrapped.insert(entry.sport.entry_tag(), JsonValue::Object(body));
        JsonValue::Object(wrapped)
    }

    fn entry(&self, state: &mut State, ctx: &Ctx, owner: Owner, sport: SportKind, id: u64) -> HttpResponse {
        let members = owner.members();
        let Some(entry) = state
            .entries
            .get(&id)
            .filter(|e| e.owner == owner && e.sport == sport)
        else {
            return status(404);
        };

        match ctx.method {
            Method::Get => {
                if ctx.can_read(entry.publicvisible(), &members) && Self::owner_visible(state, ctx, &owner) {
                    json_response(200, Self::entry_json(ctx, id, entry))
                } else {
                    ctx.deny()
                }
            }
            Method::Put => {
                if !ctx.is_member(&members) {
                    return ctx.deny();
                }
                let Some((_, fields)) = ctx.payload() else {
                    return status(400);
                };
                let now = state.tick();
                let Some(entry) = state.entries.get_mut(&id) else {
                    return status(404);
                };
                entry.fields.extend(fields);
                entry.datemodified = now;
                json_response(200, Self::entry_json(ctx, id, entry))
            }
            Method::Delete => {
                if !ctx.is_member(&members) {
                    return ctx.deny();
                }
                state.entries.remove(&id);
                status(200)
            }
            Method::Post => status(405),
        }
    }
}

impl Transport for InMemoryCoach {
    fn name(&self) -> &str {
        "memory"
    }

    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(format!("{} {}", request.method, request.url));
        }

        let url = Url::parse(&request.url)
            .map_err(|e| Error::Transport(format!("invalid URL '{}': {}", request.url, e)))?;
        let segments: Vec<String> = url
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let Some(root) = segments
            .iter()
            .position(|s| COLLECTIONS.contains(&s.as_str()))
        else {
            return Ok(status(404));
        };
        let base = if root == 0 {
            "/".to_string()
        } else {
            format!("/{}/", segments[..root].join("/"))
        };

        let query = |name: &str, default: usize| {
            request
                .query_param(name)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };

        let mut state = self.lock_state()?;
        let ctx = Ctx {
            method: request.method,
            base,
            authed: state.authenticate(request),
            start: query("start", 0),
            size: query("size", DEFAULT_PAGE_SIZE),
            body: request.body.as_deref(),
        };

        let response = self.dispatch(&mut state, &ctx, &segments[root..]);
        tracing::trace!(
            method = %request.method,
            url = %request.url,
            status = response.status(),
            "in-memory request"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Credential;

    const ROOT: &str = "http://coach.test/CyberCoachServer/resources/";

    fn get(service: &InMemoryCoach, path: &str) -> HttpResponse {
        service
            .execute(&HttpRequest::new(Method::Get, format!("{}{}", ROOT, path)))
            .unwrap()
    }

    #[test]
    fn test_authenticated_user() {
        let service = InMemoryCoach::seeded();
        let valid = Credential::new("user123", Some("test123".to_string()));
        let request = HttpRequest::new(Method::Get, format!("{}authenticateduser/", ROOT))
            .credential(Some(&valid));
        assert_eq!(service.execute(&request).unwrap().status(), 200);
        assert_eq!(get(&service, "authenticateduser/").status(), 401);
    }

    #[test]
    fn test_user_list_paging() {
        let service = InMemoryCoach::seeded();
        let request = HttpRequest::new(Method::Get, format!("{}users/", ROOT))
            .query("start", 2)
            .query("size", 3);
        let body = service.execute(&request).unwrap().to_value().unwrap();
        assert_eq!(body["available"], 7);
        assert_eq!(body["users"].as_array().unwrap().len(), 3);
        let links = body["links"].as_array().unwrap();
        assert!(links.iter().any(|l| l["description"] == "next"));
        assert!(links.iter().any(|l| l["description"] == "previous"));
    }

    #[test]
    fn test_hidden_user_needs_authentication() {
        let service = InMemoryCoach::seeded();
        assert_eq!(get(&service, "users/nopartner").status(), 401);

        let other = Credential::new("user123", Some("test123".to_string()));
        let request = HttpRequest::new(Method::Get, format!("{}users/nopartner", ROOT))
            .credential(Some(&other));
        assert_eq!(service.execute(&request).unwrap().status(), 200);
    }

    #[test]
    fn test_partnership_readable_in_either_order() {
        let service = InMemoryCoach::seeded();
        let body = get(&service, "partnerships/user321;user123").to_value().unwrap();
        assert_eq!(body["user1"]["username"], "user123");
        assert_eq!(body["userconfirmed2"], true);
    }

    #[test]
    fn test_entry_create_requires_fields() {
        let service = InMemoryCoach::seeded();
        let owner = Credential::new("user123", Some("test123".to_string()));
        let url = format!("{}users/user123/running", ROOT);

        let incomplete = HttpRequest::new(Method::Post, url.as_str())
            .credential(Some(&owner))
            .xml("<entryrunning><comment>x</comment></entryrunning>".to_string());
        assert_eq!(service.execute(&incomplete).unwrap().status(), 409);

        let complete = HttpRequest::new(Method::Post, url.as_str())
            .credential(Some(&owner))
            .xml(
                "<entryrunning><publicvisible>2</publicvisible><entryduration>60</entryduration></entryrunning>"
                    .to_string(),
            );
        let response = service.execute(&complete).unwrap();
        assert_eq!(response.status(), 201);
        assert!(response
            .header("location")
            .unwrap()
            .starts_with("/CyberCoachServer/resources/users/user123/running/"));
    }

    #[test]
    fn test_parse_xml_unescapes() {
        let (tag, fields) =
            parse_xml("<user><realname>A &amp; B</realname><email>a@b.c</email></user>").unwrap();
        assert_eq!(tag, "user");
        assert_eq!(fields["realname"], "A & B");
        assert_eq!(fields["email"], "a@b.c");
    }

    #[test]
    fn test_request_log() {
        let service = InMemoryCoach::new();
        get(&service, "sports/");
        get(&service, "sports/running");
        assert_eq!(service.request_count(), 2);
        assert_eq!(
            service.requests()[1],
            format!("GET {}sports/running", ROOT)
        );
    }
}
