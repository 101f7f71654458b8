//! Common test data and Nitrado response builders

use serde_json::{json, Value};

/// Common test server ids and names
pub mod servers {
    pub const ARK_ID: &str = "1234";
    pub const ARK_SHORT_NAME: &str = "arkse";
    pub const ARK_ADDRESS: &str = "1.2.3.4:7777";
    pub const ARK_NAME: &str = "arkse-1.2.3.4:7777";

    pub const SECOND_ID: &str = "5678";
    pub const SECOND_SHORT_NAME: &str = "valheim";
}

/// Chat platform test identities
pub mod chat {
    pub const DISCORD_CHANNEL: &str = "1000000000000001";
    pub const TELEGRAM_TOKEN: &str = "123:abc";
    pub const TELEGRAM_CHAT: &str = "-1001";
}

/// Game server as the mocked Nitrado API reports it
#[derive(Debug, Clone)]
pub struct FakeGameServer {
    pub id: String,
    pub short_name: String,
    /// Nitrado status string (`started`, `stopped`, `restarting`...)
    pub status: String,
    pub version: String,
    pub address: String,
    pub update_status: String,
}

impl FakeGameServer {
    pub fn new(id: &str, short_name: &str) -> Self {
        Self {
            id: id.to_string(),
            short_name: short_name.to_string(),
            status: "started".to_string(),
            version: "1.2".to_string(),
            address: servers::ARK_ADDRESS.to_string(),
            update_status: "up_to_date".to_string(),
        }
    }

    pub fn ark() -> Self {
        Self::new(servers::ARK_ID, servers::ARK_SHORT_NAME)
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address = address.to_string();
        self
    }

    /// Entry of `GET /services`
    pub fn service_json(&self) -> Value {
        json!({
            "id": self.id.parse::<u64>().unwrap_or_default(),
            "status": "active",
            "suspend_date": "2030-01-01T12:00:00",
            "details": {
                "folder_short": self.short_name,
                "game": "Test Game"
            }
        })
    }

    /// Body of `GET /services/{id}/gameservers`
    pub fn gameserver_json(&self) -> Value {
        json!({
            "status": "success",
            "data": {
                "gameserver": {
                    "status": self.status,
                    "game_human": "ARK: Survival Evolved",
                    "ip": "1.2.3.4",
                    "query_port": 27015,
                    "slots": 20,
                    "query": {
                        "version": self.version,
                        "connect_ip": self.address,
                        "player_max": 20,
                        "player_current": 1,
                        "players": [{ "id": 1, "name": "Alice" }]
                    },
                    "game_specific": {
                        "update_status": self.update_status
                    },
                    "credentials": {
                        "ftp": {
                            "hostname": "127.0.0.1",
                            "port": 21,
                            "username": "ftpuser",
                            "password": "ftppass"
                        },
                        "mysql": {
                            "hostname": "",
                            "port": 3306,
                            "username": "",
                            "password": "",
                            "database": ""
                        }
                    }
                }
            }
        })
    }
}

/// Body of `GET /services`
pub fn services_json(servers: &[FakeGameServer]) -> Value {
    json!({
        "status": "success",
        "data": {
            "services": servers.iter().map(FakeGameServer::service_json).collect::<Vec<_>>()
        }
    })
}

pub fn success_json(message: &str) -> Value {
    json!({ "status": "success", "message": message })
}
