// File: relay/tests/common/fixtures/mock_nitrado.rs
//! Mock Nitrado API for provider tests
//!
//! Serves the account's services from a mutable list so tests can change a
//! server's state between poll cycles, and records every command posted.

use serde_json::json;
use std::sync::{Arc, Mutex};
use wiremock::{
    matchers::{header, method, path, path_regex},
    Mock, MockServer, Request, ResponseTemplate,
};

use super::test_data::{services_json, success_json, FakeGameServer};

pub const TEST_TOKEN: &str = "test-nitrado-token";

pub struct MockNitradoServer {
    pub server: MockServer,
    pub base_url: String,
    servers: Arc<Mutex<Vec<FakeGameServer>>>,
    commands: Arc<Mutex<Vec<String>>>,
}

impl MockNitradoServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();

        Self {
            server,
            base_url,
            servers: Arc::new(Mutex::new(Vec::new())),
            commands: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Starts a server answering version, services, gameserver and command requests
    pub async fn with_servers(servers: Vec<FakeGameServer>) -> Self {
        let mock = Self::start().await;
        *mock.servers.lock().unwrap() = servers;
        mock.mock_version("nitrapi-1471-2024").await;
        mock.mock_services().await;
        mock.mock_gameservers().await;
        mock.mock_commands().await;
        mock
    }

    pub async fn mock_version(&self, version: &str) {
        Mock::given(method("GET"))
            .and(path("/version"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_json(version)))
            .mount(&self.server)
            .await;
    }

    /// Every request fails with `status_code`
    pub async fn mock_unavailable(&self, status_code: u16) {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status_code).set_body_json(json!({
                "status": "error",
                "message": "Service unavailable"
            })))
            .mount(&self.server)
            .await;
    }

    async fn mock_services(&self) {
        let servers = self.servers.clone();

        Mock::given(method("GET"))
            .and(path("/services"))
            .and(header("Authorization", TEST_TOKEN))
            .respond_with(move |_: &Request| {
                let servers = servers.lock().unwrap();
                ResponseTemplate::new(200).set_body_json(services_json(&servers))
            })
            .mount(&self.server)
            .await;
    }

    async fn mock_gameservers(&self) {
        let servers = self.servers.clone();

        Mock::given(method("GET"))
            .and(path_regex(r"^/services/[0-9]+/gameservers$"))
            .and(header("Authorization", TEST_TOKEN))
            .respond_with(move |request: &Request| {
                let id = service_id(request);
                let servers = servers.lock().unwrap();
                match servers.iter().find(|server| server.id == id) {
                    Some(server) => ResponseTemplate::new(200).set_body_json(server.gameserver_json()),
                    None => ResponseTemplate::new(404).set_body_json(json!({
                        "status": "error",
                        "message": "Service not found"
                    })),
                }
            })
            .mount(&self.server)
            .await;
    }

    /// `stop` and `restart` are accepted and applied to the served state
    async fn mock_commands(&self) {
        let servers = self.servers.clone();
        let commands = self.commands.clone();

        Mock::given(method("POST"))
            .and(path_regex(r"^/services/[0-9]+/gameservers/(stop|restart)$"))
            .and(header("Authorization", TEST_TOKEN))
            .respond_with(move |request: &Request| {
                let id = service_id(request);
                let command = request
                    .url
                    .path_segments()
                    .and_then(|mut segments| segments.next_back())
                    .unwrap_or_default()
                    .to_string();

                commands.lock().unwrap().push(format!("{} {}", command, id));

                let status = if command == "stop" { "stopped" } else { "started" };
                for server in servers.lock().unwrap().iter_mut().filter(|s| s.id == id) {
                    server.status = status.to_string();
                }

                ResponseTemplate::new(200).set_body_json(success_json("Server will be restarted now."))
            })
            .mount(&self.server)
            .await;
    }

    /// Replaces the state served for `id` from the next request on
    pub fn set_status(&self, id: &str, status: &str) {
        for server in self.servers.lock().unwrap().iter_mut().filter(|s| s.id == id) {
            server.status = status.to_string();
        }
    }

    pub fn update(&self, server: FakeGameServer) {
        let mut servers = self.servers.lock().unwrap();
        servers.retain(|s| s.id != server.id);
        servers.push(server);
    }

    pub fn remove(&self, id: &str) {
        self.servers.lock().unwrap().retain(|s| s.id != id);
    }

    /// Commands received so far, e.g. `stop 1234`
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

fn service_id(request: &Request) -> String {
    request
        .url
        .path_segments()
        .and_then(|mut segments| segments.nth(1))
        .unwrap_or_default()
        .to_string()
}
