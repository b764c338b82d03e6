//! HTTP transport port
//!
//! The resources never talk to the network directly. They build an
//! [`HttpRequest`] and hand it to whatever [`Transport`] the client was
//! constructed with (reqwest in production, the in-memory service in tests
//! and demo mode).

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::domain::result::{Error, Result};
use crate::domain::Credential;

/// HTTP verbs used by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request to the service
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Query parameters, appended by the transport
    pub query: Vec<(String, String)>,
    /// Basic auth; only sent when the credential has a password
    pub credential: Option<Credential>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            credential: None,
            headers: vec![("Accept".to_string(), "application/json".to_string())],
            body: None,
        }
    }

    pub fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Authenticate as `credential`; anonymous credentials are dropped
    pub fn credential(mut self, credential: Option<&Credential>) -> Self {
        self.credential = credential.filter(|c| c.has_password()).cloned();
        self
    }

    /// Attach an XML body and set the content type accordingly
    pub fn xml(mut self, body: String) -> Self {
        self.headers
            .push(("Content-Type".to_string(), "application/xml".to_string()));
        self.body = Some(body);
        self
    }

    /// Look up a query parameter by name
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A response from the service
///
/// Header names are stored lower-cased.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_lowercase(), value.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parse the body into a typed document
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| Error::Decode(format!("invalid JSON response: {}", e)))
    }

    /// Parse the body into a generic JSON mapping
    pub fn to_value(&self) -> Result<JsonValue> {
        self.json()
    }
}

/// Executes HTTP requests against the service
///
/// Implementations return every HTTP status as a response; only faults
/// below HTTP (connection refused, timeout, TLS) are errors.
pub trait Transport: Send + Sync {
    /// Short name for diagnostics (e.g. "reqwest", "memory")
    fn name(&self) -> &str;

    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_to_json() {
        let request = HttpRequest::new(Method::Get, "http://coach.test/users/");
        assert_eq!(
            request.headers,
            vec![("Accept".to_string(), "application/json".to_string())]
        );
        assert!(request.credential.is_none());
    }

    #[test]
    fn test_anonymous_credential_is_not_sent() {
        let anonymous = Credential::anonymous("user123");
        let request = HttpRequest::new(Method::Get, "u").credential(Some(&anonymous));
        assert!(request.credential.is_none());

        let real = Credential::new("user123", Some("test123".to_string()));
        let request = HttpRequest::new(Method::Get, "u").credential(Some(&real));
        assert_eq!(request.credential, Some(real));
    }

    #[test]
    fn test_xml_sets_content_type() {
        let request = HttpRequest::new(Method::Put, "u").xml("<user></user>".to_string());
        assert!(request
            .headers
            .contains(&("Content-Type".to_string(), "application/xml".to_string())));
        assert_eq!(request.body.as_deref(), Some("<user></user>"));
    }

    #[test]
    fn test_response_headers_are_case_insensitive() {
        let response = HttpResponse::new(201, "").with_header("Location", "/users/a/running/5/");
        assert_eq!(response.header("location"), Some("/users/a/running/5/"));
        assert_eq!(response.header("LOCATION"), Some("/users/a/running/5/"));
    }

    #[test]
    fn test_response_json() {
        let response = HttpResponse::new(200, r#"{"description": "some description"}"#);
        let value = response.to_value().unwrap();
        assert_eq!(value["description"], "some description");
        assert!(response.is_success());
    }

    #[test]
    fn test_response_not_json() {
        let response = HttpResponse::new(200, "text");
        assert!(matches!(response.to_value(), Err(Error::Decode(_))));
    }
}
