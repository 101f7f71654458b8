use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::constants::http::CONNECT_TIMEOUT;
use crate::constants::nitrado::EXPECTED_API_VERSION;
use crate::errors::ProviderError;
use crate::provider::types::{
    DatabaseCredentials, FtpCredentials, ServerRecord, ServerState, ServerStatus, ServiceSummary,
};
use crate::provider::ProviderApi;

/// HTTP wrapper around the Nitrado REST API
///
/// Every call is a single request; no state is kept between calls.
pub struct NitradoClient {
    client: Client,
    api_url: String,
    token: String,
}

impl NitradoClient {
    pub fn new(api_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Reads the API version; a failed request is fatal, an unexpected version only warns
    pub async fn verify_api_version(&self) -> Result<String> {
        let url = self.url("/version");
        let (status, body) = self.send(self.client.get(&url), &url).await?;
        if status != StatusCode::OK || !is_success(&body) {
            return Err(ProviderError::BadStatus {
                url,
                status: status.as_u16(),
            }
            .into());
        }

        let version = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if !version.contains(EXPECTED_API_VERSION) {
            warn!(
                "Nitrado API version was changed! Expected: {}, actual: {}",
                EXPECTED_API_VERSION, version
            );
        }

        Ok(version)
    }

    async fn get_authorized(&self, path: &str) -> Result<Value> {
        let url = self.url(path);
        let request = self.client.get(&url).header("Authorization", &self.token);
        let (status, body) = self.send(request, &url).await?;

        if !status.is_success() {
            return Err(ProviderError::BadStatus {
                url,
                status: status.as_u16(),
            }
            .into());
        }

        Ok(body)
    }

    async fn post_command(&self, server_id: &str, command: &str) -> Result<()> {
        let url = self.url(&format!("/services/{}/gameservers/{}", server_id, command));
        let request = self.client.post(&url).header("Authorization", &self.token);
        let (status, body) = self.send(request, &url).await?;

        if status != StatusCode::OK {
            return Err(ProviderError::BadStatus {
                url,
                status: status.as_u16(),
            }
            .into());
        }

        if !is_success(&body) {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no message");
            return Err(ProviderError::InvalidResponse {
                url,
                reason: format!("command '{}' rejected: {}", command, message),
            }
            .into());
        }

        Ok(())
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &str) -> Result<(StatusCode, Value)> {
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::ConnectionFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        debug!("Response received from {}, status code: {}", url, status);

        let body = serde_json::from_str(&text).map_err(|e| ProviderError::InvalidResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok((status, body))
    }
}

#[async_trait]
impl ProviderApi for NitradoClient {
    async fn list_services(&self) -> Result<Vec<ServiceSummary>> {
        let body = self.get_authorized("/services").await?;
        parse_services(&body).map_err(|reason| {
            ProviderError::InvalidResponse {
                url: self.url("/services"),
                reason,
            }
            .into()
        })
    }

    async fn fetch_server(&self, service: &ServiceSummary) -> Result<ServerRecord> {
        let path = format!("/services/{}/gameservers", service.id);
        let body = self.get_authorized(&path).await?;
        parse_gameserver(service, &body).map_err(|reason| {
            ProviderError::InvalidResponse {
                url: self.url(&path),
                reason,
            }
            .into()
        })
    }

    /// Nitrado starts a stopped server on restart
    async fn start_server(&self, server_id: &str) -> Result<()> {
        self.post_command(server_id, "restart").await
    }

    async fn stop_server(&self, server_id: &str) -> Result<()> {
        self.post_command(server_id, "stop").await
    }

    async fn restart_server(&self, server_id: &str) -> Result<()> {
        self.post_command(server_id, "restart").await
    }
}

fn is_success(body: &Value) -> bool {
    body.get("status").and_then(Value::as_str) == Some("success")
}

/// Accepts both JSON strings and numbers, Nitrado mixes them freely
fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn number(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}

fn small_number<T: TryFrom<u64> + Default>(value: Option<&Value>) -> T {
    T::try_from(number(value)).unwrap_or_default()
}

/// Maps `GET /services` to summaries
pub fn parse_services(body: &Value) -> Result<Vec<ServiceSummary>, String> {
    let services = body
        .pointer("/data/services")
        .and_then(Value::as_array)
        .ok_or_else(|| "missing data.services".to_string())?;

    services
        .iter()
        .map(|service| {
            let id = text(service.get("id"));
            if id.is_empty() {
                return Err("service without id".to_string());
            }

            Ok(ServiceSummary {
                id,
                short_name: text(service.pointer("/details/folder_short")),
                available_until: text(service.get("suspend_date")).replace('T', " "),
            })
        })
        .collect()
}

/// Maps `GET /services/{id}/gameservers` to a full record
pub fn parse_gameserver(service: &ServiceSummary, body: &Value) -> Result<ServerRecord, String> {
    let gameserver = body
        .pointer("/data/gameserver")
        .filter(|value| value.is_object())
        .ok_or_else(|| "missing data.gameserver".to_string())?;

    let state = match text(gameserver.get("status")).as_str() {
        "started" => ServerState::Online,
        "stopped" => ServerState::Offline,
        other => ServerState::from(other),
    };

    let mut status = ServerStatus {
        game_name: text(gameserver.get("game_human")),
        state,
        available_until: service.available_until.clone(),
        update_available: gameserver
            .pointer("/game_specific/update_status")
            .and_then(Value::as_str)
            .map(|update| update != "up_to_date")
            .unwrap_or(false),
        ..Default::default()
    };

    // An empty query (`{}` or `[]`) means the game server does not answer queries
    let query = gameserver.get("query").filter(|query| match query {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    });

    match query {
        Some(query) => {
            status.version = text(query.get("version"));
            status.address = text(query.get("connect_ip"));
            status.players_limit = small_number(query.get("player_max"));
            status.players_connected = small_number(query.get("player_current"));
            status.player_names = query
                .get("players")
                .and_then(Value::as_array)
                .map(|players| {
                    players
                        .iter()
                        .map(|player| match player {
                            Value::Object(_) => text(player.get("name")),
                            other => text(Some(other)),
                        })
                        .filter(|name| !name.is_empty())
                        .collect()
                })
                .unwrap_or_default();
        }
        None => {
            status.address = format!(
                "{}:{}",
                text(gameserver.get("ip")),
                text(gameserver.get("query_port"))
            );
            status.players_limit = small_number(gameserver.get("slots"));
        }
    }

    let ftp = gameserver
        .pointer("/credentials/ftp")
        .ok_or_else(|| "missing credentials.ftp".to_string())?;
    let ftp = FtpCredentials {
        hostname: text(ftp.get("hostname")),
        port: match small_number(ftp.get("port")) {
            0 => 21,
            port => port,
        },
        username: text(ftp.get("username")),
        password: text(ftp.get("password")),
    };

    let database = gameserver
        .pointer("/credentials/mysql")
        .map(|mysql| DatabaseCredentials {
            hostname: text(mysql.get("hostname")),
            port: small_number(mysql.get("port")),
            username: text(mysql.get("username")),
            password: text(mysql.get("password")),
            database: text(mysql.get("database")),
        })
        .filter(|mysql| !mysql.database.is_empty() && !mysql.hostname.is_empty());

    Ok(ServerRecord {
        id: service.id.clone(),
        short_name: service.short_name.clone(),
        status,
        ftp,
        database,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service() -> ServiceSummary {
        ServiceSummary {
            id: "1".to_string(),
            short_name: "arkse".to_string(),
            available_until: "2024-02-01 10:00:00".to_string(),
        }
    }

    fn gameserver(status: &str, query: Value) -> Value {
        json!({
            "status": "success",
            "data": {
                "gameserver": {
                    "status": status,
                    "game_human": "ARK: Survival Evolved",
                    "ip": "10.0.0.1",
                    "query_port": 27015,
                    "slots": 20,
                    "game_specific": { "update_status": "up_to_date" },
                    "query": query,
                    "credentials": {
                        "ftp": { "hostname": "ftp.example", "port": 21, "username": "ni1", "password": "pw" },
                        "mysql": { "hostname": "db.example", "port": 3306, "username": "ni1", "password": "pw", "database": "ni1_db" }
                    }
                }
            }
        })
    }

    #[test]
    fn test_parse_services_normalizes_fields() {
        let body = json!({
            "status": "success",
            "data": { "services": [
                { "id": 1234567, "details": { "folder_short": "arkse" }, "suspend_date": "2024-02-01T10:00:00" }
            ]}
        });

        let services = parse_services(&body).unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].id, "1234567");
        assert_eq!(services[0].short_name, "arkse");
        assert_eq!(services[0].available_until, "2024-02-01 10:00:00");
    }

    #[test]
    fn test_parse_services_rejects_unexpected_shape() {
        assert!(parse_services(&json!({ "status": "error" })).is_err());
    }

    #[test]
    fn test_parse_gameserver_with_query() {
        let body = gameserver(
            "started",
            json!({
                "version": "1.2",
                "connect_ip": "10.0.0.1:7777",
                "player_max": "70",
                "player_current": 2,
                "players": [{ "name": "Rex", "id": 1 }, "Dodo"]
            }),
        );

        let record = parse_gameserver(&service(), &body).unwrap();
        assert_eq!(record.status.state, ServerState::Online);
        assert_eq!(record.status.version, "1.2");
        assert_eq!(record.status.address, "10.0.0.1:7777");
        assert_eq!(record.status.players_limit, 70);
        assert_eq!(record.status.players_connected, 2);
        assert_eq!(record.status.player_names, vec!["Rex", "Dodo"]);
        assert!(!record.status.update_available);
        assert_eq!(record.display_name(), "arkse-10.0.0.1:7777");
        assert_eq!(record.database.unwrap().database, "ni1_db");
    }

    #[test]
    fn test_parse_gameserver_without_query_falls_back_to_ip() {
        let record = parse_gameserver(&service(), &gameserver("stopped", json!([]))).unwrap();

        assert_eq!(record.status.state, ServerState::Offline);
        assert_eq!(record.status.address, "10.0.0.1:27015");
        assert_eq!(record.status.players_limit, 20);
        assert!(record.status.version.is_empty());
        assert_eq!(record.ftp.port, 21);
    }

    #[test]
    fn test_parse_gameserver_keeps_unknown_states() {
        let record = parse_gameserver(&service(), &gameserver("restarting", json!({}))).unwrap();
        assert_eq!(record.status.state, ServerState::Restarting);

        let record = parse_gameserver(&service(), &gameserver("suspended", json!({}))).unwrap();
        assert_eq!(record.status.state.to_string(), "suspended");
    }

    #[test]
    fn test_update_status_other_than_up_to_date_flags_update() {
        let mut body = gameserver("started", json!({}));
        body["data"]["gameserver"]["game_specific"]["update_status"] = json!("update_available");

        let record = parse_gameserver(&service(), &body).unwrap();
        assert!(record.status.update_available);
    }
}
