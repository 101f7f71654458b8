// File: relay/src/config/mod.rs
pub mod manager;
use serde::{Deserialize, Serialize};
pub use manager::ConfigManager;

use crate::constants::{defaults, nitrado};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfiguration {
    #[serde(default)]
    pub general: GeneralConfiguration,
    #[serde(default)]
    pub bots: Vec<BotConfiguration>,
    #[serde(default)]
    pub server_providers: Vec<ProviderConfiguration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfiguration {
    /// Root folder for backup archives, relative paths are resolved against the working folder
    #[serde(default = "default_backups_folder")]
    pub backups_folder_path: String,
}

impl Default for GeneralConfiguration {
    fn default() -> Self {
        Self {
            backups_folder_path: default_backups_folder(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfiguration {
    #[serde(rename = "type", default)]
    pub bot_type: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub privileged_users: Vec<String>,
    #[serde(default)]
    pub allowed_channels: Vec<String>,
    #[serde(default = "default_notify_polling")]
    pub notify_polling_seconds: u64,
    // Overrides the platform endpoint (self-hosted gateways, tests)
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfiguration {
    #[serde(rename = "type", default)]
    pub provider_type: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_polling")]
    pub polling_seconds: u64,
    #[serde(default)]
    pub notifications: NotificationToggles,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_ignore_folders")]
    pub ignore_folders: Vec<String>,
    #[serde(default = "default_restore_timeout")]
    pub restore_timeout_seconds: u64,
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_seconds: u64,
}

impl ProviderConfiguration {
    /// Configuration with every optional field at its default value
    pub fn new(provider_type: &str, token: &str) -> Self {
        Self {
            provider_type: provider_type.to_string(),
            token: token.to_string(),
            timeout_seconds: default_timeout(),
            polling_seconds: default_polling(),
            notifications: NotificationToggles::default(),
            api_url: default_api_url(),
            ignore_folders: default_ignore_folders(),
            restore_timeout_seconds: default_restore_timeout(),
            startup_timeout_seconds: default_startup_timeout(),
        }
    }
}

/// Which state transitions produce an outbound notification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationToggles {
    #[serde(default)]
    pub on_new_server: bool,
    #[serde(default)]
    pub on_status_change: bool,
    #[serde(default)]
    pub on_address_change: bool,
    #[serde(default)]
    pub on_version_change: bool,
    #[serde(default)]
    pub on_update_available_change: bool,
}

impl NotificationToggles {
    pub fn all() -> Self {
        Self {
            on_new_server: true,
            on_status_change: true,
            on_address_change: true,
            on_version_change: true,
            on_update_available_change: true,
        }
    }
}

fn default_backups_folder() -> String {
    defaults::BACKUPS_FOLDER.to_string()
}

fn default_notify_polling() -> u64 {
    defaults::NOTIFY_POLLING_SECONDS
}

fn default_timeout() -> u64 {
    defaults::PROVIDER_TIMEOUT_SECONDS
}

fn default_polling() -> u64 {
    defaults::PROVIDER_POLLING_SECONDS
}

fn default_api_url() -> String {
    nitrado::DEFAULT_API_URL.to_string()
}

fn default_ignore_folders() -> Vec<String> {
    defaults::IGNORE_FOLDERS.iter().map(|s| s.to_string()).collect()
}

fn default_restore_timeout() -> u64 {
    defaults::RESTORE_TIMEOUT_SECONDS
}

fn default_startup_timeout() -> u64 {
    defaults::STARTUP_TIMEOUT_SECONDS
}
