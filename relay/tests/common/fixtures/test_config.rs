// File: relay/tests/common/fixtures/test_config.rs
//! Builder writing `relay.toml` into a temporary working folder

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::mock_nitrado::TEST_TOKEN;

pub struct TestConfigBuilder {
    temp_dir: TempDir,
    backups_folder: Option<String>,
    providers: Vec<ProviderConfigBuilder>,
    bots: Vec<BotConfigBuilder>,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self {
            temp_dir,
            backups_folder: None,
            providers: Vec::new(),
            bots: Vec::new(),
        }
    }

    pub fn backups_folder(mut self, folder: &str) -> Self {
        self.backups_folder = Some(folder.to_string());
        self
    }

    /// Adds a Nitrado provider pointed at `api_url`
    pub fn with_provider<F>(mut self, api_url: &str, f: F) -> Self
    where
        F: FnOnce(ProviderConfigBuilder) -> ProviderConfigBuilder,
    {
        self.providers.push(f(ProviderConfigBuilder::new(api_url)));
        self
    }

    pub fn with_bot<F>(mut self, bot_type: &str, api_url: &str, f: F) -> Self
    where
        F: FnOnce(BotConfigBuilder) -> BotConfigBuilder,
    {
        self.bots.push(f(BotConfigBuilder::new(bot_type, api_url)));
        self
    }

    pub fn build(self) -> TestConfig {
        let mut toml = String::new();
        if let Some(folder) = &self.backups_folder {
            toml.push_str(&format!("[general]\nbackups_folder_path = \"{}\"\n", folder));
        }
        for provider in &self.providers {
            toml.push_str(&provider.to_toml());
        }
        for bot in &self.bots {
            toml.push_str(&bot.to_toml());
        }

        fs::write(self.temp_dir.path().join("relay.toml"), toml).expect("Failed to write relay.toml");

        TestConfig {
            working_folder: self.temp_dir.path().to_path_buf(),
            _temp_dir: self.temp_dir,
        }
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ProviderConfigBuilder {
    provider_type: String,
    token: String,
    api_url: String,
    polling_seconds: u64,
    startup_timeout_seconds: u64,
    notify_status_change: bool,
}

impl ProviderConfigBuilder {
    fn new(api_url: &str) -> Self {
        Self {
            provider_type: "nitrado".to_string(),
            token: TEST_TOKEN.to_string(),
            api_url: api_url.to_string(),
            polling_seconds: 1,
            startup_timeout_seconds: 5,
            notify_status_change: true,
        }
    }

    pub fn provider_type(mut self, provider_type: &str) -> Self {
        self.provider_type = provider_type.to_string();
        self
    }

    pub fn token(mut self, token: &str) -> Self {
        self.token = token.to_string();
        self
    }

    pub fn startup_timeout(mut self, seconds: u64) -> Self {
        self.startup_timeout_seconds = seconds;
        self
    }

    fn to_toml(&self) -> String {
        format!(
            r#"
[[server_providers]]
type = "{}"
token = "{}"
api_url = "{}"
polling_seconds = {}
startup_timeout_seconds = {}

[server_providers.notifications]
on_status_change = {}
"#,
            self.provider_type,
            self.token,
            self.api_url,
            self.polling_seconds,
            self.startup_timeout_seconds,
            self.notify_status_change
        )
    }
}

pub struct BotConfigBuilder {
    bot_type: String,
    token: String,
    api_url: String,
    allowed_channels: Vec<String>,
    privileged_users: Vec<String>,
}

impl BotConfigBuilder {
    fn new(bot_type: &str, api_url: &str) -> Self {
        Self {
            bot_type: bot_type.to_string(),
            token: "test-bot-token".to_string(),
            api_url: api_url.to_string(),
            allowed_channels: Vec::new(),
            privileged_users: Vec::new(),
        }
    }

    pub fn token(mut self, token: &str) -> Self {
        self.token = token.to_string();
        self
    }

    pub fn channel(mut self, channel: &str) -> Self {
        self.allowed_channels.push(channel.to_string());
        self
    }

    pub fn privileged(mut self, user: &str) -> Self {
        self.privileged_users.push(user.to_string());
        self
    }

    fn to_toml(&self) -> String {
        format!(
            r#"
[[bots]]
type = "{}"
token = "{}"
api_url = "{}"
notify_polling_seconds = 1
allowed_channels = {:?}
privileged_users = {:?}
"#,
            self.bot_type, self.token, self.api_url, self.allowed_channels, self.privileged_users
        )
    }
}

pub struct TestConfig {
    _temp_dir: TempDir,
    pub working_folder: PathBuf,
}

impl TestConfig {
    pub fn path(&self) -> &Path {
        &self.working_folder
    }

    pub fn backups_root(&self) -> PathBuf {
        self.working_folder.join("backups")
    }
}
