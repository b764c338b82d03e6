//! reqwest-backed transport
//!
//! Blocking client with a fixed timeout. Non-2xx statuses are not errors at
//! this level; the client maps them.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::domain::result::{Error, Result};
use crate::ports::{HttpRequest, HttpResponse, Method, Transport};

/// Transport that talks to the real service over HTTP
#[derive(Debug)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Map request errors to readable messages
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Transport(format!(
                "Connection timed out after {} seconds",
                self.timeout.as_secs()
            ))
        } else if error.is_connect() {
            Error::Transport("Unable to connect to the CyberCoach server".to_string())
        } else {
            Error::Transport(format!("Request failed: {}", error))
        }
    }
}

impl Transport for ReqwestTransport {
    fn name(&self) -> &str {
        "http"
    }

    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Put => self.client.put(&request.url),
            Method::Post => self.client.post(&request.url),
            Method::Delete => self.client.delete(&request.url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(credential) = &request.credential {
            builder = builder.basic_auth(&credential.username, credential.password.as_deref());
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().map_err(|e| self.map_request_error(e))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().map_err(|e| self.map_request_error(e))?;

        let mut result = HttpResponse::new(status, body);
        for (name, value) in headers {
            result = result.with_header(&name, value);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transport() {
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        assert_eq!(transport.name(), "http");
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();
        let request = HttpRequest::new(Method::Get, "http://127.0.0.1:1/resources/");
        match transport.execute(&request) {
            Err(Error::Transport(_)) => {}
            other => panic!("expected transport error, got {:?}", other),
        }
    }
}
