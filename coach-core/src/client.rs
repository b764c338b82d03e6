//! Client for the CyberCoach service
//!
//! Holds the service location and the injected [`Transport`], and applies
//! the status mapping shared by every resource:
//!
//! - 2xx: success
//! - 404: [`Error::NotFound`]
//! - 401 / 403: [`Error::Unauthorized`]
//!
//! Any other status is handed back to the caller. Reads turn it into
//! [`Error::UnexpectedStatus`]; writes let the resource decide (409 means
//! incomplete information, anything else means the write was rejected).

use std::fmt;
use std::sync::Arc;

use crate::adapters::http::ReqwestTransport;
use crate::adapters::memory::InMemoryCoach;
use crate::config::Config;
use crate::domain::result::{Error, Result};
use crate::domain::{Credential, Payload, SportKind};
use crate::ports::{HttpRequest, HttpResponse, Method, Transport};
use crate::resources::{IntoUser, Partnership, Sport, Subscription, User};

/// Default window used when a listing has to retrieve everything
pub const DEFAULT_LIST_ALL_SIZE: usize = 1000;

/// Path of the credential check endpoint, relative to the service URL
const AUTHENTICATION_PATH: &str = "authenticateduser/";

/// Handle on the remote service; cheap to clone
#[derive(Clone)]
pub struct Client {
    url: String,
    list_all_size: usize,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.url)
            .field("transport", &self.transport.name())
            .finish()
    }
}

impl Client {
    /// Create a client for the service at `host` + `path`
    ///
    /// `path` is the resource root, e.g. `/CyberCoachServer/resources/`.
    pub fn new(host: &str, path: &str, transport: Arc<dyn Transport>) -> Self {
        let mut url = format!("{}{}", host.trim_end_matches('/'), path);
        if !url.ends_with('/') {
            url.push('/');
        }

        Self {
            url,
            list_all_size: DEFAULT_LIST_ALL_SIZE,
            transport,
        }
    }

    /// Create a client from loaded configuration
    ///
    /// Demo mode uses a seeded in-memory service instead of the network.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport: Arc<dyn Transport> = if config.demo_mode {
            Arc::new(InMemoryCoach::seeded())
        } else {
            Arc::new(ReqwestTransport::new(config.timeout())?)
        };

        Ok(Self::new(&config.host, &config.path, transport).with_list_all_size(config.list_all_size))
    }

    /// Override the window used by list-all scans
    pub fn with_list_all_size(mut self, size: usize) -> Self {
        self.list_all_size = size.max(1);
        self
    }

    /// Base URL of the service resources (always ends with `/`)
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn list_all_size(&self) -> usize {
        self.list_all_size
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Absolute URL of a path relative to the resource root
    pub fn resource_url(&self, relative: &str) -> String {
        format!("{}{}", self.url, relative)
    }

    /// Send a request and apply the shared status mapping
    pub fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.transport.execute(&request)?;

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            authenticated = request.credential.is_some(),
            status = response.status(),
            "coach request"
        );

        match response.status() {
            200..=299 => Ok(response),
            404 => Err(Error::not_found(request.url)),
            401 | 403 => Err(Error::unauthorized()),
            _ => Ok(response),
        }
    }

    /// GET a resource; any status other than 2xx is an error
    pub fn get(&self, url: &str, credential: Option<&Credential>) -> Result<HttpResponse> {
        self.get_request(HttpRequest::new(Method::Get, url).credential(credential))
    }

    /// GET with a caller-built request (query parameters, ...)
    pub fn get_request(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        let response = self.execute(request)?;
        if !response.is_success() {
            return Err(Error::UnexpectedStatus {
                status: response.status(),
                url,
            });
        }
        Ok(response)
    }

    /// PUT an XML payload; non-mapped statuses are returned to the caller
    pub fn put(
        &self,
        url: &str,
        credential: Option<&Credential>,
        payload: &Payload,
    ) -> Result<HttpResponse> {
        let request = HttpRequest::new(Method::Put, url)
            .credential(credential)
            .xml(payload.to_xml()?);
        self.execute(request)
    }

    /// POST an XML payload; non-mapped statuses are returned to the caller
    pub fn post(
        &self,
        url: &str,
        credential: Option<&Credential>,
        payload: &Payload,
    ) -> Result<HttpResponse> {
        let request = HttpRequest::new(Method::Post, url)
            .credential(credential)
            .xml(payload.to_xml()?);
        self.execute(request)
    }

    /// DELETE a resource; any status other than 2xx is an error
    pub fn delete(&self, url: &str, credential: Option<&Credential>) -> Result<HttpResponse> {
        let response = self.execute(HttpRequest::new(Method::Delete, url).credential(credential))?;
        if !response.is_success() {
            return Err(Error::UnexpectedStatus {
                status: response.status(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    /// Whether the credential is valid on the service
    ///
    /// A credential without a password is rejected without a request.
    pub fn authenticated(&self, credential: &Credential) -> Result<bool> {
        if !credential.has_password() {
            return Ok(false);
        }

        match self.get(&self.resource_url(AUTHENTICATION_PATH), Some(credential)) {
            Ok(_) => Ok(true),
            Err(Error::Unauthorized { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Fetch a sport
    pub fn get_sport(&self, sport: SportKind) -> Result<Sport> {
        let mut sport = Sport::new(self, sport);
        sport.update()?;
        Ok(sport)
    }

    /// Fetch a user
    pub fn get_user(&self, username: &str) -> Result<User> {
        let mut user = User::new(self, username);
        user.update()?;
        Ok(user)
    }

    /// Fetch a partnership
    pub fn get_partnership(&self, user1: impl IntoUser, user2: impl IntoUser) -> Result<Partnership> {
        let mut partnership = Partnership::new(self, user1, user2);
        partnership.update()?;
        Ok(partnership)
    }

    /// Fetch the subscription of a user to a sport
    pub fn get_user_subscription(
        &self,
        user: impl IntoUser,
        sport: SportKind,
    ) -> Result<Subscription> {
        let mut subscription = Subscription::for_user(self, user, sport);
        subscription.update()?;
        Ok(subscription)
    }

    /// Fetch the subscription of a partnership to a sport
    pub fn get_partnership_subscription(
        &self,
        user1: impl IntoUser,
        user2: impl IntoUser,
        sport: SportKind,
    ) -> Result<Subscription> {
        let partnership = Partnership::new(self, user1, user2);
        let mut subscription = Subscription::for_partnership(self, partnership, sport);
        subscription.update()?;
        Ok(subscription)
    }
}
