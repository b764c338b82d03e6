//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use coach_core::ports::{HttpRequest, HttpResponse, Transport};
use coach_core::{Client, InMemoryCoach, Result, User};

pub const HOST: &str = "http://coach.test";
pub const PATH: &str = "/CyberCoachServer/resources/";

/// A client over a freshly seeded in-memory service
pub fn setup() -> (Client, Arc<InMemoryCoach>) {
    let service = Arc::new(InMemoryCoach::seeded());
    let client = Client::new(HOST, PATH, service.clone());
    (client, service)
}

pub fn user(client: &Client, username: &str, password: &str) -> User {
    User::new(client, username).with_password(password)
}

/// Service that accepts every credential and answers every other request
/// with a fixed status
pub struct FixedStatus(pub u16);

impl Transport for FixedStatus {
    fn name(&self) -> &str {
        "fixed"
    }

    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        if request.url.ends_with("authenticateduser/") {
            return Ok(HttpResponse::new(200, "{}"));
        }
        Ok(HttpResponse::new(self.0, ""))
    }
}

pub fn fixed_status_client(status: u16) -> Client {
    Client::new(HOST, PATH, Arc::new(FixedStatus(status)))
}
