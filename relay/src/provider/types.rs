//! Server state types shared by every provider

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle state of a game server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerState {
    Online,
    Offline,
    Restarting,
    #[default]
    Unknown,
    /// Provider specific state without a portable meaning
    Other(String),
}

impl ServerState {
    pub fn is_offline(&self) -> bool {
        matches!(self, ServerState::Offline)
    }
}

impl From<&str> for ServerState {
    fn from(state: &str) -> Self {
        match state.to_lowercase().as_str() {
            "online" => ServerState::Online,
            "offline" => ServerState::Offline,
            "restarting" => ServerState::Restarting,
            "unknown" | "" => ServerState::Unknown,
            other => ServerState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerState::Online => write!(f, "online"),
            ServerState::Offline => write!(f, "offline"),
            ServerState::Restarting => write!(f, "restarting"),
            ServerState::Unknown => write!(f, "unknown"),
            ServerState::Other(state) => write!(f, "{}", state),
        }
    }
}

/// Point-in-time view of a game server, replaced wholesale on every poll
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub game_name: String,
    pub version: String,
    pub address: String,
    pub state: ServerState,
    /// Date until the rented server stays available
    pub available_until: String,
    /// A game update is published but not installed yet
    pub update_available: bool,
    pub players_limit: u32,
    pub players_connected: u32,
    pub player_names: Vec<String>,
}

impl ServerStatus {
    /// Placeholder returned for servers missing from the current snapshot
    pub fn unknown() -> Self {
        Self::default()
    }

    /// `<game> (<version>) - <address>` heading used by notifications and replies
    pub fn title(&self) -> String {
        let mut title = self.game_name.clone();
        if !self.version.is_empty() {
            title.push_str(&format!(" ({})", self.version));
        }
        title.push_str(&format!(" - {}", self.address));
        title
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FtpCredentials {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseCredentials {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

/// Everything a provider knows about one of its servers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub id: String,
    /// Game folder short name, e.g. `arkse`
    pub short_name: String,
    pub status: ServerStatus,
    pub ftp: FtpCredentials,
    pub database: Option<DatabaseCredentials>,
}

impl ServerRecord {
    /// Name shown to chat users
    pub fn display_name(&self) -> String {
        format!("{}-{}", self.short_name, self.status.address)
    }
}

/// Minimal listing entry returned by a provider before details are fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSummary {
    pub id: String,
    pub short_name: String,
    pub available_until: String,
}

/// Immutable id → record map published once per poll cycle
pub type ServerSnapshot = BTreeMap<String, ServerRecord>;

/// Identifier/name pair used to build facades
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEntry {
    pub id: String,
    pub name: String,
}
