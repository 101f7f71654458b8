// File: relay/src/config/manager.rs
use super::RelayConfiguration;
use crate::constants::defaults;
use crate::errors::ConfigError;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

pub struct ConfigManager {
    working_folder: PathBuf,
    current_config: Arc<RelayConfiguration>,
}

impl ConfigManager {
    pub async fn new(working_folder: impl AsRef<Path>) -> Result<Self> {
        let working_folder = working_folder.as_ref().to_path_buf();
        let config = Self::load_configuration(&working_folder).await?;
        Ok(Self {
            working_folder,
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<RelayConfiguration> {
        self.current_config.clone()
    }

    pub fn working_folder(&self) -> &Path {
        &self.working_folder
    }

    /// Absolute backup root; relative paths live under the working folder
    pub fn backup_root(&self) -> PathBuf {
        let configured = Path::new(&self.current_config.general.backups_folder_path);
        if configured.is_absolute() {
            configured.to_path_buf()
        } else {
            self.working_folder.join(configured)
        }
    }

    async fn load_configuration(working_folder: &Path) -> Result<RelayConfiguration> {
        let config_path = working_folder.join(defaults::CONFIG_FILE_NAME);
        debug!("Loading configuration: {}", config_path.display());

        let content = fs::read_to_string(&config_path)
            .await
            .map_err(|e| ConfigError::LoadFailed {
                path: config_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let config = Self::parse(&content)?;

        info!(
            "Loaded {} server providers, {} bots",
            config.server_providers.len(),
            config.bots.len()
        );

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<RelayConfiguration, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            reason: e.to_string(),
        })
    }
}
