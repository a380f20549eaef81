//! Mock push function for testing
//!
//! Simulates the HTTP function that fans a message out to device tokens.

use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const PUSH_PATH: &str = "/sendNotification";

pub struct PushMockServer {
    pub server: MockServer,
}

impl PushMockServer {
    pub async fn new() -> Self {
        Self { server: MockServer::start().await }
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.server.uri(), PUSH_PATH)
    }

    /// Every call reports one successful delivery
    pub async fn mock_success(&self) {
        self.mock_response(200, json!({ "successCount": 1, "failureCount": 0 })).await;
    }

    pub async fn mock_response(&self, status: u16, body: Value) {
        Mock::given(method("POST"))
            .and(path(PUSH_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn received_bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }
}
